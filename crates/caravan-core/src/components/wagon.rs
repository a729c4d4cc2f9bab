//! Wagon component: a storage grid on a moving body.

use caravan_logic::grid::{Bounds, GridCell, GridFrame, GridLayout, GridSize, ModuleRotation, Quat, Vec3};
use caravan_logic::occupancy::{Footprinted, OccupancyIndex, Placement};
use caravan_logic::placement::{PlacementCheck, PlacementError, PlacementResolver};
use caravan_logic::storage::{Item, LooseItem, ModuleType, StorageModule};
use serde::{Deserialize, Serialize};

/// Tint the renderer uses for a placement ghost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreviewColor {
    Valid,
    Invalid,
}

/// Where the ghost of a module would land, for the render collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPreview {
    pub origin: GridCell,
    /// Centre of the resolved footprint
    pub world_position: Vec3,
    pub rotation: Quat,
    pub color: PreviewColor,
    /// Reason shown to the player when the drop is refused
    pub error: Option<PlacementError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wagon {
    pub name: String,
    pub layout: GridLayout,
    pub body_position: Vec3,
    pub body_rotation: Quat,
    pub modules: Vec<StorageModule>,
    pub loose_items: Vec<LooseItem>,
}

impl Wagon {
    pub fn new(name: impl Into<String>, layout: GridLayout) -> Self {
        Self {
            name: name.into(),
            layout,
            body_position: Vec3::ZERO,
            body_rotation: Quat::IDENTITY,
            modules: Vec::new(),
            loose_items: Vec::new(),
        }
    }

    /// 4 × 3 × 6 bed of half-metre cells.
    pub fn standard_layout() -> GridLayout {
        GridLayout {
            size: GridSize::new(4, 3, 6),
            cell_size: 0.5,
            reference: Bounds {
                center: Vec3::new(0.0, 1.25, 0.0),
                half_extents: Vec3::new(1.0, 0.75, 1.5),
            },
        }
    }

    /// Grid frame for the body's current transform.
    pub fn frame(&self) -> GridFrame {
        self.layout.frame_at(self.body_position, self.body_rotation)
    }

    /// Every footprint in the bed, modules first.
    pub fn occupied(&self) -> Vec<Placement> {
        self.modules
            .iter()
            .map(|m| *m.placement())
            .chain(self.loose_items.iter().map(|l| *l.placement()))
            .collect()
    }

    /// Resolves a drop of `footprint` near `candidate`.
    pub fn check(&self, candidate: GridCell, footprint: GridSize, rotation: ModuleRotation) -> PlacementCheck {
        let occupied = self.occupied();
        PlacementResolver::new(self.layout.size, &occupied).evaluate(candidate, footprint.oriented(rotation))
    }

    /// Ghost for a module held over `hit_point`.
    pub fn preview(&self, hit_point: Vec3, module_type: &ModuleType, rotation: ModuleRotation) -> PlacementPreview {
        let frame = self.frame();
        let check = self.check(frame.world_to_grid(hit_point), module_type.footprint, rotation);
        let size = module_type.footprint.oriented(rotation);
        PlacementPreview {
            origin: check.origin,
            world_position: frame.footprint_center(check.origin, size),
            rotation: self.body_rotation * Quat::from_yaw(rotation.yaw_radians()),
            color: if check.is_valid() {
                PreviewColor::Valid
            } else {
                PreviewColor::Invalid
            },
            error: check.result.err(),
        }
    }

    /// Places a module where the resolver puts it. Returns its origin.
    pub fn place_module(
        &mut self,
        module_type: &ModuleType,
        candidate: GridCell,
        rotation: ModuleRotation,
    ) -> Result<GridCell, PlacementError> {
        let check = self.check(candidate, module_type.footprint, rotation);
        check.result?;
        self.modules.push(StorageModule::new(
            module_type.clone(),
            Placement::new(check.origin, module_type.footprint, rotation),
        ));
        Ok(check.origin)
    }

    pub fn module_index_at(&self, cell: GridCell) -> Option<usize> {
        OccupancyIndex::new(&self.modules).occupant_at(cell)
    }

    pub fn module_at(&self, cell: GridCell) -> Option<&StorageModule> {
        self.module_index_at(cell).map(|i| &self.modules[i])
    }

    pub fn module_at_mut(&mut self, cell: GridCell) -> Option<&mut StorageModule> {
        let index = self.module_index_at(cell)?;
        self.modules.get_mut(index)
    }

    fn is_blocked_above(&self, placement: &Placement) -> bool {
        let occupied = self.occupied();
        OccupancyIndex::new(&occupied).is_region_occupied_above(placement)
    }

    /// Removes the module covering `cell`. It must be empty with nothing
    /// resting on it.
    pub fn remove_module(&mut self, cell: GridCell) -> Result<StorageModule, PlacementError> {
        let index = self.module_index_at(cell).ok_or(PlacementError::NothingThere)?;
        let module = &self.modules[index];
        if !module.is_empty() {
            return Err(PlacementError::NotEmpty);
        }
        if self.is_blocked_above(&module.placement) {
            return Err(PlacementError::BlockedAbove);
        }
        Ok(self.modules.remove(index))
    }

    /// Stows goods directly in the bed.
    pub fn stow_loose(
        &mut self,
        item: Item,
        footprint: GridSize,
        candidate: GridCell,
        rotation: ModuleRotation,
    ) -> Result<GridCell, PlacementError> {
        let check = self.check(candidate, footprint, rotation);
        check.result?;
        self.loose_items.push(LooseItem {
            item,
            placement: Placement::new(check.origin, footprint, rotation),
        });
        Ok(check.origin)
    }

    /// Picks up the loose goods covering `cell`.
    pub fn take_loose(&mut self, cell: GridCell) -> Result<Item, PlacementError> {
        let index = OccupancyIndex::new(&self.loose_items)
            .occupant_at(cell)
            .ok_or(PlacementError::NothingThere)?;
        if self.is_blocked_above(&self.loose_items[index].placement) {
            return Err(PlacementError::BlockedAbove);
        }
        Ok(self.loose_items.remove(index).item)
    }

    /// Units of `commodity` aboard, in modules and loose.
    pub fn cargo_count(&self, commodity: &str) -> u32 {
        let stowed: u32 = self.modules.iter().map(|m| m.count_of(commodity)).sum();
        let loose: u32 = self
            .loose_items
            .iter()
            .filter(|l| l.item.commodity == commodity)
            .map(|l| l.item.count)
            .sum();
        stowed + loose
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.loose_items.is_empty()
    }
}
