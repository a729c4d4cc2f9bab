//! Static content: commodities, module types, events, settlements, roads.
//!
//! Content is authored as JSON and is allowed to be incomplete while it's
//! being worked on. Loading never fails on a bad reference: duplicates,
//! dangling ids, and out-of-range numbers are logged and skipped or clamped.

use caravan_logic::effects::EventEffect;
use caravan_logic::events::{EventDef, EventScope};
use caravan_logic::grid::Vec3;
use caravan_logic::roads::Road;
use caravan_logic::storage::{CommodityDef, ModuleType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Content shipped with the game.
pub const BUNDLED_CONTENT: &str = include_str!("../../../data/content.json");

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A commodity a settlement trades, with optional local overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketListing {
    pub commodity: String,
    #[serde(default)]
    pub base_price: Option<f64>,
    #[serde(default)]
    pub volatility: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementDef {
    pub name: String,
    #[serde(default)]
    pub zone: Option<String>,
    /// Map position (x, z).
    #[serde(default)]
    pub position: [f32; 2],
    #[serde(default)]
    pub market: Vec<MarketListing>,
    /// Events (local, seasonal, or global) that may occur here.
    #[serde(default)]
    pub allowed_events: Vec<String>,
}

impl SettlementDef {
    pub fn map_position(&self) -> Vec3 {
        Vec3::new(self.position[0], 0.0, self.position[1])
    }
}

/// A region whose settlements share global events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDef {
    pub id: String,
    #[serde(default)]
    pub global_events: Vec<String>,
}

/// Something that can happen on arrival after a journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterDef {
    pub id: String,
    pub description: String,
    /// Chance per arrival.
    pub chance: f64,
    pub effects: Vec<EventEffect>,
}

/// Raw JSON layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContentFile {
    pub commodities: Vec<CommodityDef>,
    pub module_types: Vec<ModuleType>,
    pub events: Vec<EventDef>,
    pub settlements: Vec<SettlementDef>,
    pub roads: Vec<Road>,
    pub zones: Vec<ZoneDef>,
    pub encounters: Vec<EncounterDef>,
}

/// Validated content with id lookups.
#[derive(Debug, Clone, Default)]
pub struct Content {
    pub commodities: BTreeMap<String, CommodityDef>,
    pub module_types: BTreeMap<String, ModuleType>,
    pub events: BTreeMap<String, EventDef>,
    /// In file order; settlement registration follows it.
    pub settlements: Vec<SettlementDef>,
    pub roads: Vec<Road>,
    pub zones: Vec<ZoneDef>,
    pub encounters: Vec<EncounterDef>,
}

fn index_by_id<T>(items: Vec<T>, kind: &str, id: impl Fn(&T) -> &str) -> BTreeMap<String, T> {
    let mut map = BTreeMap::new();
    for item in items {
        let key = id(&item).to_string();
        if map.contains_key(&key) {
            log::warn!("Duplicate {} '{}' ignored", kind, key);
            continue;
        }
        map.insert(key, item);
    }
    map
}

impl Content {
    pub fn bundled() -> Result<Self, ContentError> {
        Self::from_json(BUNDLED_CONTENT)
    }

    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let file: ContentFile = serde_json::from_str(json)?;
        Ok(Self::from_file(file))
    }

    pub fn from_file(file: ContentFile) -> Self {
        let mut commodities = index_by_id(file.commodities, "commodity", |c| c.id.as_str());
        for def in commodities.values_mut() {
            if def.unit_size == 0 {
                log::warn!("Commodity '{}' has zero unit size, using 1", def.id);
                def.unit_size = 1;
            }
        }

        let module_types = index_by_id(file.module_types, "module type", |m| m.id.as_str());

        let mut events = index_by_id(file.events, "event", |e| e.id.as_str());
        for def in events.values_mut() {
            let clamped = def.sanitize();
            if clamped > 0 {
                log::warn!("Event '{}': clamped {} effect strength(s)", def.id, clamped);
            }
            for effect in &def.effects {
                if !commodities.contains_key(&effect.commodity) {
                    log::warn!(
                        "Event '{}' affects unknown commodity '{}'",
                        def.id,
                        effect.commodity
                    );
                }
            }
        }

        let mut names = HashSet::new();
        let mut settlements = Vec::new();
        for mut def in file.settlements {
            if !names.insert(def.name.clone()) {
                log::warn!("Duplicate settlement '{}' ignored", def.name);
                continue;
            }
            def.market.retain(|listing| {
                let known = commodities.contains_key(&listing.commodity);
                if !known {
                    log::warn!(
                        "Settlement '{}' lists unknown commodity '{}'",
                        def.name,
                        listing.commodity
                    );
                }
                known
            });
            def.allowed_events.retain(|id| {
                let known = events.contains_key(id);
                if !known {
                    log::warn!("Settlement '{}' allows unknown event '{}'", def.name, id);
                }
                known
            });
            settlements.push(def);
        }

        let roads: Vec<Road> = file
            .roads
            .into_iter()
            .filter(|road| {
                let ok = names.contains(&road.a) && names.contains(&road.b);
                if !ok {
                    log::warn!("Road '{}' <-> '{}' references an unknown settlement", road.a, road.b);
                }
                ok
            })
            .collect();

        let zones = file
            .zones
            .into_iter()
            .map(|mut zone| {
                zone.global_events.retain(|id| match events.get(id) {
                    Some(def) if def.scope == EventScope::Global => true,
                    Some(_) => {
                        log::warn!("Zone '{}': event '{}' is not global", zone.id, id);
                        false
                    }
                    None => {
                        log::warn!("Zone '{}': unknown event '{}'", zone.id, id);
                        false
                    }
                });
                zone
            })
            .collect();

        let content = Self {
            commodities,
            module_types,
            events,
            settlements,
            roads,
            zones,
            encounters: file.encounters,
        };
        log::info!(
            "Content loaded: {} commodities, {} module types, {} events, {} settlements, {} roads",
            content.commodities.len(),
            content.module_types.len(),
            content.events.len(),
            content.settlements.len(),
            content.roads.len()
        );
        content
    }

    pub fn commodity(&self, id: &str) -> Option<&CommodityDef> {
        self.commodities.get(id)
    }

    pub fn module_type(&self, id: &str) -> Option<&ModuleType> {
        self.module_types.get(id)
    }

    pub fn event(&self, id: &str) -> Option<&EventDef> {
        self.events.get(id)
    }

    pub fn settlement(&self, name: &str) -> Option<&SettlementDef> {
        self.settlements.iter().find(|s| s.name == name)
    }

    pub fn zone(&self, id: &str) -> Option<&ZoneDef> {
        self.zones.iter().find(|z| z.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caravan_logic::effects::IntelTarget;
    use caravan_logic::storage::StorageType;

    #[test]
    fn test_bundled_content_loads() {
        let content = Content::bundled().unwrap();
        assert!(content.commodities.len() >= 5);
        assert!(content.module_types.len() >= 3);
        assert!(content.settlements.len() >= 4);
        assert!(!content.roads.is_empty());
        assert!(content
            .module_types
            .values()
            .any(|m| m.storage_type == StorageType::Fluid));
    }

    #[test]
    fn test_bad_references_skipped() {
        let json = r#"{
            "commodities": [
                {"id": "salt", "name": "Salt", "storage_type": "General", "unit_size": 0, "base_price": 4.0},
                {"id": "salt", "name": "Salt again", "storage_type": "General", "unit_size": 1, "base_price": 9.0}
            ],
            "events": [
                {"id": "rush", "name": "Salt rush", "lead_time": 1, "duration": 2, "death_time": 1,
                 "frequency": 2.0, "seasonal_modifiers": [1, 1, 1, 1],
                 "effects": [{"commodity": "salt", "strength": 40.0}]}
            ],
            "settlements": [
                {"name": "Ashford", "market": [{"commodity": "salt"}, {"commodity": "gold"}],
                 "allowed_events": ["rush", "plague"]},
                {"name": "Ashford"}
            ],
            "roads": [{"a": "Ashford", "b": "Nowhere"}],
            "zones": [{"id": "north", "global_events": ["rush"]}]
        }"#;
        let content = Content::from_json(json).unwrap();
        assert_eq!(content.commodities.len(), 1);
        assert_eq!(content.commodity("salt").unwrap().unit_size, 1);
        assert_eq!(content.commodity("salt").unwrap().name, "Salt");
        assert_eq!(content.event("rush").unwrap().effects[0].strength, 10.0);
        assert_eq!(content.settlements.len(), 1);
        assert_eq!(content.settlements[0].market.len(), 1);
        assert_eq!(content.settlements[0].allowed_events, vec!["rush"]);
        assert!(content.roads.is_empty());
        assert!(content.zone("north").unwrap().global_events.is_empty());
    }

    #[test]
    fn test_encounter_effects_parse() {
        let json = r#"{
            "encounters": [
                {"id": "toll", "description": "A toll bridge", "chance": 0.5, "effects": [
                    {"kind": "coin", "amount": -15},
                    {"kind": "duration", "target": "Events", "hours": 0},
                    {"kind": "item", "commodity": "salt", "count": 2},
                    {"kind": "none"}
                ]}
            ]
        }"#;
        let content = Content::from_json(json).unwrap();
        let effects = &content.encounters[0].effects;
        assert_eq!(effects[0], EventEffect::Coin { amount: -15 });
        assert_eq!(
            effects[1],
            EventEffect::Duration {
                target: IntelTarget::Events,
                hours: 0
            }
        );
        assert_eq!(effects[3], EventEffect::None);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(Content::from_json("{ not json"), Err(ContentError::Json(_))));
    }
}
