//! Cell occupancy over placed footprints.
//!
//! Wagon grids are small (a few hundred cells) and hold a handful of
//! modules, so queries scan the placement list and iterate cuboids cell by
//! cell. No spatial index is kept.

use serde::{Deserialize, Serialize};

use crate::grid::{GridCell, GridSize, ModuleRotation};

/// Where a module or loose item sits in its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub origin: GridCell,
    /// Unrotated footprint.
    pub size: GridSize,
    pub rotation: ModuleRotation,
}

impl Placement {
    pub fn new(origin: GridCell, size: GridSize, rotation: ModuleRotation) -> Self {
        Self {
            origin,
            size,
            rotation,
        }
    }

    /// Footprint as laid out in the grid (X/Z swapped when rotated).
    pub fn extents(&self) -> GridSize {
        self.size.oriented(self.rotation)
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        let ext = self.extents();
        cell.x >= self.origin.x
            && cell.x < self.origin.x + ext.x
            && cell.y >= self.origin.y
            && cell.y < self.origin.y + ext.y
            && cell.z >= self.origin.z
            && cell.z < self.origin.z + ext.z
    }

    /// Origin of the one-cell-thick layer resting directly on top.
    pub fn layer_above(&self) -> (GridCell, GridSize) {
        let ext = self.extents();
        (
            self.origin.offset(0, ext.y, 0),
            GridSize::new(ext.x, 1, ext.z),
        )
    }
}

/// Anything that occupies grid cells.
pub trait Footprinted {
    fn placement(&self) -> &Placement;
}

impl Footprinted for Placement {
    fn placement(&self) -> &Placement {
        self
    }
}

/// Every cell of the cuboid at `origin` with extent `size`.
pub fn region_cells(origin: GridCell, size: GridSize) -> impl Iterator<Item = GridCell> {
    (0..size.x.max(0)).flat_map(move |dx| {
        (0..size.y.max(0)).flat_map(move |dy| {
            (0..size.z.max(0)).map(move |dz| origin.offset(dx, dy, dz))
        })
    })
}

/// Read-only occupancy view over a slice of placed things.
pub struct OccupancyIndex<'a, T> {
    occupants: &'a [T],
}

impl<'a, T: Footprinted> OccupancyIndex<'a, T> {
    pub fn new(occupants: &'a [T]) -> Self {
        Self { occupants }
    }

    pub fn is_occupied(&self, cell: GridCell) -> bool {
        self.occupant_at(cell).is_some()
    }

    /// Index of the occupant covering `cell`, if any.
    pub fn occupant_at(&self, cell: GridCell) -> Option<usize> {
        self.occupants
            .iter()
            .position(|o| o.placement().contains(cell))
    }

    pub fn is_region_occupied(&self, origin: GridCell, size: GridSize) -> bool {
        region_cells(origin, size).any(|cell| self.is_occupied(cell))
    }

    /// Whether anything rests on top of `occupant`.
    pub fn is_region_occupied_above(&self, occupant: &T) -> bool {
        let (origin, size) = occupant.placement().layer_above();
        self.is_region_occupied(origin, size)
    }

    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(x: i32, y: i32, z: i32, size: GridSize) -> Placement {
        Placement::new(GridCell::new(x, y, z), size, ModuleRotation::Deg0)
    }

    #[test]
    fn test_overlapping_region() {
        let placed = vec![block(0, 0, 0, GridSize::new(2, 1, 2))];
        let index = OccupancyIndex::new(&placed);
        assert!(index.is_region_occupied(GridCell::new(1, 0, 1), GridSize::new(2, 1, 2)));
    }

    #[test]
    fn test_adjacent_region_is_free() {
        let placed = vec![block(0, 0, 0, GridSize::new(2, 1, 2))];
        let index = OccupancyIndex::new(&placed);
        assert!(!index.is_region_occupied(GridCell::new(2, 0, 0), GridSize::new(2, 1, 2)));
        assert!(!index.is_region_occupied(GridCell::new(0, 1, 0), GridSize::new(2, 1, 2)));
    }

    #[test]
    fn test_disjoint_region_is_free() {
        let placed = vec![
            block(0, 0, 0, GridSize::UNIT),
            block(5, 0, 5, GridSize::UNIT),
        ];
        let index = OccupancyIndex::new(&placed);
        assert!(!index.is_region_occupied(GridCell::new(2, 0, 2), GridSize::new(2, 2, 2)));
    }

    #[test]
    fn test_rotation_swaps_footprint() {
        let mut p = block(0, 0, 0, GridSize::new(3, 1, 1));
        assert!(p.contains(GridCell::new(2, 0, 0)));
        assert!(!p.contains(GridCell::new(0, 0, 2)));

        p.rotation = ModuleRotation::Deg90;
        assert!(!p.contains(GridCell::new(2, 0, 0)));
        assert!(p.contains(GridCell::new(0, 0, 2)));
    }

    #[test]
    fn test_occupied_above() {
        let placed = vec![
            block(0, 0, 0, GridSize::new(2, 1, 2)),
            block(1, 1, 1, GridSize::UNIT),
        ];
        let index = OccupancyIndex::new(&placed);
        assert!(index.is_region_occupied_above(&placed[0]));
        assert!(!index.is_region_occupied_above(&placed[1]));
    }

    #[test]
    fn test_occupant_at() {
        let placed = vec![
            block(0, 0, 0, GridSize::UNIT),
            block(1, 0, 0, GridSize::new(1, 2, 1)),
        ];
        let index = OccupancyIndex::new(&placed);
        assert_eq!(index.occupant_at(GridCell::new(1, 1, 0)), Some(1));
        assert_eq!(index.occupant_at(GridCell::new(2, 0, 0)), None);
    }

    #[test]
    fn test_region_cells_volume() {
        let size = GridSize::new(2, 3, 4);
        assert_eq!(region_cells(GridCell::ORIGIN, size).count() as i64, size.volume());
    }
}
