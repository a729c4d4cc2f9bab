//! Save/Load functionality for persisting simulation state
//!
//! Uses bincode for compact binary serialization. The format version is
//! written first and checked before the body is decoded. Static content is
//! not saved: modules are stored as `(module type id, origin, rotation)`
//! plus contents and rebuilt from the content catalog on load.

use caravan_logic::clock::GameTime;
use caravan_logic::events::EventBook;
use caravan_logic::grid::{GridCell, GridLayout, ModuleRotation, Quat, Vec3};
use caravan_logic::intel::Intel;
use caravan_logic::occupancy::Placement;
use caravan_logic::party::Party;
use caravan_logic::storage::{Item, LooseItem, StorageModule};
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use thiserror::Error;

use crate::components::{Market, Settlement, Wagon};
use crate::content::Content;
use crate::systems::Journey;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub now: GameTime,
    pub party: Party,
    pub location: Option<String>,
    pub journey: Option<Journey>,
    pub settlements: Vec<SavedSettlement>,
    pub wagons: Vec<SavedWagon>,
}

/// Mutable state of one settlement, keyed by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSettlement {
    pub name: String,
    pub market: Market,
    pub events: EventBook,
    pub intel: Intel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModule {
    pub module_type: String,
    pub origin: GridCell,
    pub rotation: ModuleRotation,
    pub items: Vec<Item>,
}

impl From<&StorageModule> for SavedModule {
    fn from(module: &StorageModule) -> Self {
        Self {
            module_type: module.module_type.id.clone(),
            origin: module.placement.origin,
            rotation: module.placement.rotation,
            items: module.items.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedWagon {
    pub name: String,
    pub layout: GridLayout,
    pub body_position: Vec3,
    pub body_rotation: Quat,
    pub modules: Vec<SavedModule>,
    pub loose_items: Vec<LooseItem>,
}

impl From<&Wagon> for SavedWagon {
    fn from(wagon: &Wagon) -> Self {
        Self {
            name: wagon.name.clone(),
            layout: wagon.layout,
            body_position: wagon.body_position,
            body_rotation: wagon.body_rotation,
            modules: wagon.modules.iter().map(SavedModule::from).collect(),
            loose_items: wagon.loose_items.clone(),
        }
    }
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Settlement state in registration order
pub fn serialize_settlements(world: &World, order: &[Entity]) -> Vec<SavedSettlement> {
    order
        .iter()
        .filter_map(|&entity| {
            let settlement = world.get::<&Settlement>(entity).ok()?;
            let market = world.get::<&Market>(entity).ok()?;
            let events = world.get::<&EventBook>(entity).ok()?;
            let intel = world.get::<&Intel>(entity).ok()?;
            Some(SavedSettlement {
                name: settlement.name.clone(),
                market: (*market).clone(),
                events: (*events).clone(),
                intel: *intel,
            })
        })
        .collect()
}

pub fn serialize_wagons(world: &World) -> Vec<SavedWagon> {
    world
        .query::<&Wagon>()
        .iter()
        .map(|(_, wagon)| SavedWagon::from(wagon))
        .collect()
}

/// Overlays saved state onto already-registered settlements. Saved
/// settlements that no longer exist, and listings for commodities that no
/// longer exist, are dropped with a warning.
pub fn restore_settlements(
    world: &mut World,
    index: &HashMap<String, Entity>,
    content: &Content,
    saved: Vec<SavedSettlement>,
) {
    for mut state in saved {
        let Some(&entity) = index.get(&state.name) else {
            log::warn!("Save mentions unknown settlement '{}', skipping", state.name);
            continue;
        };
        state.market.prices.retain(|commodity, _| {
            let known = content.commodity(commodity).is_some();
            if !known {
                log::warn!("{}: dropping saved price for unknown '{}'", state.name, commodity);
            }
            known
        });
        let Ok((market, book, intel)) = world.query_one_mut::<(&mut Market, &mut EventBook, &mut Intel)>(entity)
        else {
            continue;
        };
        *market = state.market;
        *book = state.events;
        *intel = state.intel;
    }
}

/// Rebuilds a wagon, resolving module types through the content catalog.
pub fn restore_wagon(content: &Content, saved: SavedWagon) -> Wagon {
    let mut wagon = Wagon::new(saved.name, saved.layout);
    wagon.body_position = saved.body_position;
    wagon.body_rotation = saved.body_rotation;
    wagon.loose_items = saved.loose_items;

    for module in saved.modules {
        let Some(module_type) = content.module_type(&module.module_type) else {
            log::warn!(
                "{}: dropping module of unknown type '{}' at {:?}",
                wagon.name,
                module.module_type,
                module.origin
            );
            continue;
        };
        let placement = Placement::new(module.origin, module_type.footprint, module.rotation);
        wagon.modules.push(StorageModule::restore(
            module_type.clone(),
            placement,
            module.items,
            |id| content.commodity(id),
        ));
    }
    wagon
}

/// Writes the version header followed by the snapshot.
pub fn write_save<W: Write>(mut writer: W, data: &SaveData) -> Result<(), SaveError> {
    bincode::serialize_into(&mut writer, &SAVE_VERSION)?;
    bincode::serialize_into(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}

/// Reads a snapshot, refusing other format versions.
pub fn read_save<R: Read>(mut reader: R) -> Result<SaveData, SaveError> {
    let version: u32 = bincode::deserialize_from(&mut reader)?;
    if version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: version,
        });
    }
    Ok(bincode::deserialize_from(&mut reader)?)
}
