//! Placement resolution: clamp to bounds, stack on top, require support.
//!
//! A cursor-driven preview calls [`PlacementResolver::evaluate`] every
//! frame with the raw hit cell. The resolver snaps the footprint back inside
//! the grid, lifts it onto whatever is already there, and reports whether
//! the final spot is a legal drop.

use thiserror::Error;

use crate::grid::{GridCell, GridSize};
use crate::occupancy::{Footprinted, OccupancyIndex};

/// Why a module can't go (or come out) where asked. The message is shown
/// to the player as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("That doesn't fit inside the wagon.")]
    OutOfBounds,
    #[error("Something is already in that spot.")]
    Occupied,
    #[error("It needs to rest fully on the floor or on other modules.")]
    Unsupported,
    #[error("Something is stacked on top of it.")]
    BlockedAbove,
    #[error("Empty the module before removing it.")]
    NotEmpty,
    #[error("There is nothing there to remove.")]
    NothingThere,
    #[error("Unknown module type '{0}'.")]
    UnknownModule(String),
}

/// Outcome of resolving a candidate drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementCheck {
    /// Origin after bounds clamping and stacking.
    pub origin: GridCell,
    pub result: Result<(), PlacementError>,
}

impl PlacementCheck {
    pub fn is_valid(&self) -> bool {
        self.result.is_ok()
    }
}

/// Placement queries over one grid and its current occupants.
pub struct PlacementResolver<'a, T> {
    grid: GridSize,
    index: OccupancyIndex<'a, T>,
}

impl<'a, T: Footprinted> PlacementResolver<'a, T> {
    pub fn new(grid: GridSize, occupants: &'a [T]) -> Self {
        Self {
            grid,
            index: OccupancyIndex::new(occupants),
        }
    }

    pub fn index(&self) -> &OccupancyIndex<'a, T> {
        &self.index
    }

    /// Shifts the origin inward on any axis where the footprint spills past
    /// the grid, then clamps at zero. Never rotates.
    pub fn adjust_for_bounds(&self, origin: GridCell, size: GridSize) -> GridCell {
        fn clamp_axis(origin: i32, size: i32, extent: i32) -> i32 {
            let shifted = if origin + size > extent {
                extent - size
            } else {
                origin
            };
            shifted.max(0)
        }

        GridCell::new(
            clamp_axis(origin.x, size.x, self.grid.x),
            clamp_axis(origin.y, size.y, self.grid.y),
            clamp_axis(origin.z, size.z, self.grid.z),
        )
    }

    /// Lowest free Y at or above `origin.y`. If nothing is free below
    /// `height - size.y` the overflowing attempt is returned, which fails
    /// any later bounds check.
    pub fn resolve_stack_height(&self, origin: GridCell, size: GridSize) -> GridCell {
        let max_y = self.grid.y - size.y;
        let mut candidate = origin;
        while self.index.is_region_occupied(candidate, size) {
            candidate.y += 1;
            if candidate.y > max_y {
                break;
            }
        }
        candidate
    }

    /// Ground level always holds. Above it, every column under the
    /// footprint must have something directly beneath.
    pub fn is_fully_supported(&self, origin: GridCell, size: GridSize) -> bool {
        if origin.y == 0 {
            return true;
        }
        (0..size.x).all(|dx| {
            (0..size.z).all(|dz| {
                self.index
                    .is_occupied(GridCell::new(origin.x + dx, origin.y - 1, origin.z + dz))
            })
        })
    }

    /// Full resolution of a candidate footprint (already oriented).
    pub fn evaluate(&self, candidate: GridCell, size: GridSize) -> PlacementCheck {
        let adjusted = self.adjust_for_bounds(candidate, size);
        let origin = self.resolve_stack_height(adjusted, size);

        let result = if !self.grid.fits(origin, size) {
            Err(PlacementError::OutOfBounds)
        } else if self.index.is_region_occupied(origin, size) {
            Err(PlacementError::Occupied)
        } else if !self.is_fully_supported(origin, size) {
            Err(PlacementError::Unsupported)
        } else {
            Ok(())
        };

        PlacementCheck { origin, result }
    }
}
