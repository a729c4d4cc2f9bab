//! Storage modules and the goods inside them.
//!
//! Rules, checked in order when loading goods into a module:
//! 1. The module's storage type must match the commodity's.
//! 2. Fluid and livestock modules hold one commodity at a time.
//! 3. Capacity is measured in volume (`count × unit_size`). When the whole
//!    stack doesn't fit, as many whole units as fit are moved and the rest
//!    stays where it came from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::GridSize;
use crate::occupancy::{Footprinted, Placement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    General,
    Cold,
    Fluid,
    Livestock,
}

impl StorageType {
    /// Fluids and animals can't share a container with anything else.
    pub fn is_single_commodity(self) -> bool {
        matches!(self, StorageType::Fluid | StorageType::Livestock)
    }
}

/// Static description of a tradeable good.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommodityDef {
    pub id: String,
    pub name: String,
    pub storage_type: StorageType,
    /// Volume taken by one unit.
    pub unit_size: u32,
    /// Default base price when a settlement listing doesn't set one.
    pub base_price: f64,
    /// Default daily volatility, as a fraction of price.
    #[serde(default)]
    pub volatility: f64,
    /// Footprint when stowed loose in open cargo space.
    #[serde(default)]
    pub footprint: GridSize,
}

/// Static description of a placeable storage module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleType {
    pub id: String,
    pub name: String,
    /// Volume the module holds.
    pub capacity: u32,
    pub storage_type: StorageType,
    pub footprint: GridSize,
    /// Handle the renderer uses to pick a mesh.
    #[serde(default)]
    pub visual: String,
}

/// A stack of one commodity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub commodity: String,
    pub count: u32,
}

impl Item {
    pub fn new(commodity: impl Into<String>, count: u32) -> Self {
        Self {
            commodity: commodity.into(),
            count,
        }
    }
}

/// Why goods couldn't move. The message is shown to the player as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("{commodity} can't be stored in a {module} module.")]
    IncompatibleStorage { commodity: String, module: String },
    #[error("This module already holds {existing}; it can only carry one kind at a time.")]
    MixedCommodity { existing: String },
    #[error("There is no room left in this module.")]
    CapacityExceeded,
    #[error("Not enough {commodity} here (have {available}, asked for {requested}).")]
    InsufficientQuantity {
        commodity: String,
        available: u32,
        requested: u32,
    },
    #[error("Unknown commodity '{0}'.")]
    UnknownCommodity(String),
    #[error("Those goods are {item}, not {commodity}.")]
    CommodityMismatch { item: String, commodity: String },
    #[error("No module at that position.")]
    NoModule,
}

/// How much of a load request went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub moved: u32,
    /// Units left at the source.
    pub remaining: u32,
}

impl Transfer {
    pub fn is_partial(&self) -> bool {
        self.remaining > 0
    }
}

/// A module placed in a wagon grid, with its contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageModule {
    pub module_type: ModuleType,
    pub placement: Placement,
    pub items: Vec<Item>,
    used_volume: u32,
}

impl Footprinted for StorageModule {
    fn placement(&self) -> &Placement {
        &self.placement
    }
}

impl StorageModule {
    pub fn new(module_type: ModuleType, placement: Placement) -> Self {
        Self {
            module_type,
            placement,
            items: Vec::new(),
            used_volume: 0,
        }
    }

    /// Rebuilds a module from saved contents. Items whose commodity is
    /// unknown are dropped with a warning.
    pub fn restore<'c>(
        module_type: ModuleType,
        placement: Placement,
        items: Vec<Item>,
        lookup: impl Fn(&str) -> Option<&'c CommodityDef>,
    ) -> Self {
        let mut module = Self::new(module_type, placement);
        for item in items {
            match lookup(&item.commodity) {
                Some(def) => {
                    module.used_volume = module
                        .used_volume
                        .saturating_add(item.count.saturating_mul(def.unit_size.max(1)));
                    module.items.push(item);
                }
                None => log::warn!(
                    "Dropping {} x '{}' from {}: unknown commodity",
                    item.count,
                    item.commodity,
                    module.module_type.id
                ),
            }
        }
        module
    }

    pub fn used_volume(&self) -> u32 {
        self.used_volume
    }

    pub fn free_volume(&self) -> u32 {
        self.module_type.capacity.saturating_sub(self.used_volume)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count_of(&self, commodity: &str) -> u32 {
        self.items
            .iter()
            .filter(|i| i.commodity == commodity)
            .map(|i| i.count)
            .sum()
    }

    /// Loads as much of `source` as the rules allow. Moved units are taken
    /// off `source.count`.
    pub fn add_item(&mut self, source: &mut Item, def: &CommodityDef) -> Result<Transfer, StorageError> {
        if source.count == 0 {
            return Ok(Transfer {
                moved: 0,
                remaining: 0,
            });
        }

        if source.commodity != def.id {
            return Err(StorageError::CommodityMismatch {
                item: source.commodity.clone(),
                commodity: def.id.clone(),
            });
        }

        if self.module_type.storage_type != def.storage_type {
            return Err(StorageError::IncompatibleStorage {
                commodity: def.name.clone(),
                module: self.module_type.name.clone(),
            });
        }

        if self.module_type.storage_type.is_single_commodity() {
            if let Some(other) = self.items.iter().find(|i| i.commodity != def.id) {
                return Err(StorageError::MixedCommodity {
                    existing: other.commodity.clone(),
                });
            }
        }

        let unit = def.unit_size.max(1);
        let free = self.free_volume();
        let moved = if source.count.saturating_mul(unit) <= free {
            source.count
        } else {
            free / unit
        };
        if moved == 0 {
            return Err(StorageError::CapacityExceeded);
        }

        match self.items.iter_mut().find(|i| i.commodity == def.id) {
            Some(stack) => stack.count += moved,
            None => self.items.push(Item::new(def.id.clone(), moved)),
        }
        self.used_volume += moved * unit;
        source.count -= moved;

        Ok(Transfer {
            moved,
            remaining: source.count,
        })
    }

    /// Takes `count` units out. Destructive removal discards them; otherwise
    /// they come back as an [`Item`] for the caller's pending pool.
    pub fn remove_item(
        &mut self,
        def: &CommodityDef,
        count: u32,
        destructive: bool,
    ) -> Result<Option<Item>, StorageError> {
        if count == 0 {
            return Ok(None);
        }

        let available = self.count_of(&def.id);
        let Some(pos) = self.items.iter().position(|i| i.commodity == def.id) else {
            return Err(StorageError::InsufficientQuantity {
                commodity: def.name.clone(),
                available,
                requested: count,
            });
        };
        if count > available {
            return Err(StorageError::InsufficientQuantity {
                commodity: def.name.clone(),
                available,
                requested: count,
            });
        }

        self.items[pos].count -= count;
        if self.items[pos].count == 0 {
            self.items.remove(pos);
        }
        self.used_volume = self
            .used_volume
            .saturating_sub(count * def.unit_size.max(1));

        if destructive {
            Ok(None)
        } else {
            Ok(Some(Item::new(def.id.clone(), count)))
        }
    }
}

/// Goods that aren't assigned to any module yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPool {
    items: Vec<Item>,
}

impl ItemPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds goods, merging with an existing stack of the same commodity.
    pub fn deposit(&mut self, item: Item) {
        if item.count == 0 {
            return;
        }
        match self.items.iter_mut().find(|i| i.commodity == item.commodity) {
            Some(stack) => stack.count += item.count,
            None => self.items.push(item),
        }
    }

    /// Removes up to `count` units; returns how many were taken.
    pub fn withdraw(&mut self, commodity: &str, count: u32) -> u32 {
        let Some(pos) = self.items.iter().position(|i| i.commodity == commodity) else {
            return 0;
        };
        let taken = count.min(self.items[pos].count);
        self.items[pos].count -= taken;
        if self.items[pos].count == 0 {
            self.items.remove(pos);
        }
        taken
    }

    pub fn count_of(&self, commodity: &str) -> u32 {
        self.items
            .iter()
            .filter(|i| i.commodity == commodity)
            .map(|i| i.count)
            .sum()
    }

    pub fn get_mut(&mut self, commodity: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.commodity == commodity)
    }

    /// Drops stacks emptied by partial transfers.
    pub fn prune(&mut self) {
        self.items.retain(|i| i.count > 0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Goods stowed directly in open cargo space rather than in a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LooseItem {
    pub item: Item,
    pub placement: Placement,
}

impl Footprinted for LooseItem {
    fn placement(&self) -> &Placement {
        &self.placement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridCell, ModuleRotation};

    fn commodity(id: &str, storage_type: StorageType, unit_size: u32) -> CommodityDef {
        CommodityDef {
            id: id.to_string(),
            name: id.to_string(),
            storage_type,
            unit_size,
            base_price: 10.0,
            volatility: 0.1,
            footprint: GridSize::UNIT,
        }
    }

    fn module(storage_type: StorageType, capacity: u32) -> StorageModule {
        StorageModule::new(
            ModuleType {
                id: "crate".into(),
                name: "Crate".into(),
                capacity,
                storage_type,
                footprint: GridSize::UNIT,
                visual: String::new(),
            },
            Placement::new(GridCell::ORIGIN, GridSize::UNIT, ModuleRotation::Deg0),
        )
    }

    #[test]
    fn test_partial_transfer_rounds_down() {
        let ore = commodity("ore", StorageType::General, 3);
        let mut m = module(StorageType::General, 10);
        let mut source = Item::new("ore", 5);

        let t = m.add_item(&mut source, &ore).unwrap();
        assert_eq!(t.moved, 3);
        assert_eq!(t.remaining, 2);
        assert_eq!(source.count, 2);
        assert_eq!(m.count_of("ore"), 3);
        assert_eq!(m.used_volume(), 9);
    }

    #[test]
    fn test_full_transfer_merges_stack() {
        let grain = commodity("grain", StorageType::General, 1);
        let mut m = module(StorageType::General, 20);
        let mut a = Item::new("grain", 4);
        let mut b = Item::new("grain", 6);
        m.add_item(&mut a, &grain).unwrap();
        let t = m.add_item(&mut b, &grain).unwrap();
        assert!(!t.is_partial());
        assert_eq!(m.items.len(), 1);
        assert_eq!(m.count_of("grain"), 10);
        assert_eq!(b.count, 0);
    }

    #[test]
    fn test_mismatched_definition_rejected() {
        let grain = commodity("grain", StorageType::General, 1);
        let mut m = module(StorageType::General, 20);
        let mut salt = Item::new("salt", 4);
        assert_eq!(
            m.add_item(&mut salt, &grain),
            Err(StorageError::CommodityMismatch {
                item: "salt".into(),
                commodity: "grain".into(),
            })
        );
        assert_eq!(salt.count, 4);
        assert!(m.is_empty());
    }

    #[test]
    fn test_restore_saturates_corrupt_counts() {
        let horses = commodity("horses", StorageType::General, 8);
        let m = StorageModule::restore(
            module(StorageType::General, 32).module_type,
            Placement::new(GridCell::ORIGIN, GridSize::UNIT, ModuleRotation::Deg0),
            vec![Item::new("horses", u32::MAX), Item::new("horses", 3)],
            |id| (id == "horses").then_some(&horses),
        );
        assert_eq!(m.used_volume(), u32::MAX);
        assert_eq!(m.free_volume(), 0);
    }

    #[test]
    fn test_incompatible_storage() {
        let water = commodity("water", StorageType::Fluid, 1);
        let mut m = module(StorageType::General, 20);
        let mut source = Item::new("water", 1);
        assert!(matches!(
            m.add_item(&mut source, &water),
            Err(StorageError::IncompatibleStorage { .. })
        ));
        assert_eq!(source.count, 1);
    }

    #[test]
    fn test_single_commodity_rule() {
        let water = commodity("water", StorageType::Fluid, 1);
        let wine = commodity("wine", StorageType::Fluid, 1);
        let mut barrel = module(StorageType::Fluid, 20);
        barrel.add_item(&mut Item::new("water", 2), &water).unwrap();
        let err = barrel.add_item(&mut Item::new("wine", 2), &wine).unwrap_err();
        assert_eq!(
            err,
            StorageError::MixedCommodity {
                existing: "water".into()
            }
        );
        // Same commodity is fine
        assert!(barrel.add_item(&mut Item::new("water", 3), &water).is_ok());
    }

    #[test]
    fn test_general_mixes_commodities() {
        let grain = commodity("grain", StorageType::General, 1);
        let cloth = commodity("cloth", StorageType::General, 2);
        let mut m = module(StorageType::General, 20);
        m.add_item(&mut Item::new("grain", 4), &grain).unwrap();
        m.add_item(&mut Item::new("cloth", 3), &cloth).unwrap();
        assert_eq!(m.used_volume(), 10);
        assert_eq!(m.items.len(), 2);
    }

    #[test]
    fn test_full_module_rejects() {
        let ore = commodity("ore", StorageType::General, 3);
        let mut m = module(StorageType::General, 2);
        assert_eq!(
            m.add_item(&mut Item::new("ore", 1), &ore),
            Err(StorageError::CapacityExceeded)
        );
    }

    #[test]
    fn test_remove_returns_to_pool() {
        let ore = commodity("ore", StorageType::General, 3);
        let mut m = module(StorageType::General, 30);
        m.add_item(&mut Item::new("ore", 5), &ore).unwrap();

        let returned = m.remove_item(&ore, 2, false).unwrap();
        assert_eq!(returned, Some(Item::new("ore", 2)));
        assert_eq!(m.count_of("ore"), 3);
        assert_eq!(m.used_volume(), 9);

        assert_eq!(m.remove_item(&ore, 3, true).unwrap(), None);
        assert!(m.is_empty());
        assert_eq!(m.used_volume(), 0);
    }

    #[test]
    fn test_remove_too_many_rejected() {
        let ore = commodity("ore", StorageType::General, 1);
        let mut m = module(StorageType::General, 30);
        m.add_item(&mut Item::new("ore", 2), &ore).unwrap();
        assert!(matches!(
            m.remove_item(&ore, 5, false),
            Err(StorageError::InsufficientQuantity {
                available: 2,
                requested: 5,
                ..
            })
        ));
        assert_eq!(m.count_of("ore"), 2);
    }

    #[test]
    fn test_zero_count_is_noop() {
        let ore = commodity("ore", StorageType::General, 1);
        let mut m = module(StorageType::General, 30);
        let t = m.add_item(&mut Item::new("ore", 0), &ore).unwrap();
        assert_eq!(t.moved, 0);
        assert_eq!(m.remove_item(&ore, 0, false).unwrap(), None);
    }

    #[test]
    fn test_item_pool() {
        let mut pool = ItemPool::new();
        pool.deposit(Item::new("salt", 4));
        pool.deposit(Item::new("salt", 2));
        pool.deposit(Item::new("wool", 0));
        assert_eq!(pool.count_of("salt"), 6);
        assert_eq!(pool.iter().count(), 1);
        assert_eq!(pool.withdraw("salt", 10), 6);
        assert!(pool.is_empty());
        assert_eq!(pool.withdraw("salt", 1), 0);
    }
}
