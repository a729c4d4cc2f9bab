//! Settlement components: identity and market.

use caravan_logic::grid::Vec3;
use caravan_logic::market::PriceState;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::content::{Content, SettlementDef};

/// Identity and static properties of a settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    /// Unique name, also the road graph key
    pub name: String,
    pub zone: Option<String>,
    pub position: Vec3,
    /// Events that may occur here
    pub allowed_events: Vec<String>,
}

impl Settlement {
    pub fn from_def(def: &SettlementDef) -> Self {
        Self {
            name: def.name.clone(),
            zone: def.zone.clone(),
            position: def.map_position(),
            allowed_events: def.allowed_events.clone(),
        }
    }

    pub fn allows(&self, event_id: &str) -> bool {
        self.allowed_events.iter().any(|id| id == event_id)
    }

    pub fn in_zone(&self, zone_id: &str) -> bool {
        self.zone.as_deref() == Some(zone_id)
    }
}

/// Per-commodity prices at one settlement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Market {
    pub prices: BTreeMap<String, PriceState>,
}

impl Market {
    /// Builds the market from a settlement's listings. Listing overrides win
    /// over the commodity defaults.
    pub fn from_def(def: &SettlementDef, content: &Content, rng: &mut impl Rng) -> Self {
        let mut prices = BTreeMap::new();
        for listing in &def.market {
            let Some(commodity) = content.commodity(&listing.commodity) else {
                log::warn!(
                    "{}: skipping listing for unknown commodity '{}'",
                    def.name,
                    listing.commodity
                );
                continue;
            };
            let base = listing.base_price.unwrap_or(commodity.base_price);
            let volatility = listing.volatility.unwrap_or(commodity.volatility);
            prices.insert(commodity.id.clone(), PriceState::new(base, volatility, rng));
        }
        Self { prices }
    }

    pub fn trades(&self, commodity: &str) -> bool {
        self.prices.contains_key(commodity)
    }

    /// True price per unit at `hour`.
    pub fn price_of(&self, commodity: &str, hour: u32) -> Option<f64> {
        self.prices.get(commodity).map(|p| p.price_per_unit(hour))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MarketListing;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_listing_overrides_defaults() {
        let content = Content::bundled().unwrap();
        let def = SettlementDef {
            name: "Testford".into(),
            zone: None,
            position: [3.0, 4.0],
            market: vec![
                MarketListing {
                    commodity: "grain".into(),
                    base_price: Some(100.0),
                    volatility: Some(0.0),
                },
                MarketListing {
                    commodity: "moonstone".into(),
                    base_price: None,
                    volatility: None,
                },
            ],
            allowed_events: vec!["drought".into()],
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let market = Market::from_def(&def, &content, &mut rng);

        assert_eq!(market.prices.len(), 1);
        assert_eq!(market.price_of("grain", 0), Some(100.0));
        assert_eq!(market.price_of("grain", 17), Some(100.0));
        assert_eq!(market.price_of("salt", 0), None);

        let settlement = Settlement::from_def(&def);
        assert_eq!(settlement.position, Vec3::new(3.0, 0.0, 4.0));
        assert!(settlement.allows("drought"));
        assert!(!settlement.allows("border_war"));
        assert!(!settlement.in_zone("lowlands"));
    }
}
