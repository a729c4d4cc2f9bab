//! Market system - daily fluctuation, event multipliers, and price quotes

use caravan_logic::clock::{GameTime, Tick};
use caravan_logic::events::{EventBook, EventDef};
use caravan_logic::intel::Intel;
use caravan_logic::market::{price_band, PriceBand, PriceState};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::components::Market;

/// What the UI shows for one commodity. `-1/-1` means unknowable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub item_id: String,
    pub min: f64,
    pub max: f64,
}

impl PriceQuote {
    pub fn new(item_id: impl Into<String>, band: PriceBand) -> Self {
        Self {
            item_id: item_id.into(),
            min: band.min,
            max: band.max,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.min < 0.0 && self.max < 0.0
    }
}

/// Rolls the daily multipliers for any midnights crossed, then rebuilds
/// each commodity's event multiplier from the running events.
pub fn update_market(
    market: &mut Market,
    book: &EventBook,
    tick: &Tick,
    defs: &BTreeMap<String, EventDef>,
    rng: &mut impl Rng,
) {
    let days = tick.days_elapsed();
    for (commodity, state) in market.prices.iter_mut() {
        state.advance_days(days, rng);
        state.events_multiplier = book.commodity_multiplier(commodity, tick.now, defs, rng);
    }
}

/// Band the player sees for one price. Perfect intel shows the exact
/// price; otherwise the band widens with road distance. `None` distance
/// (unreachable) is unknowable.
pub fn quote_band(
    state: &PriceState,
    now: GameTime,
    intel: &Intel,
    distance: Option<u32>,
    player_level: u32,
    rng: &mut impl Rng,
) -> PriceBand {
    let price = state.price_per_unit(now.hour);
    if intel.prices.is_active(now) {
        return PriceBand::exact(price);
    }
    match distance {
        Some(d) => price_band(price, d, player_level, rng),
        None => PriceBand::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caravan_logic::clock::TimeClock;
    use caravan_logic::events::{CommodityEffect, EventScope};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn flat(base: f64) -> PriceState {
        PriceState {
            base_price: base,
            volatility: 0.0,
            todays_multiplier: 1.0,
            tomorrows_multiplier: 1.0,
            events_multiplier: 1.0,
        }
    }

    #[test]
    fn test_event_multiplier_applied() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let defs: BTreeMap<String, EventDef> = [EventDef {
            id: "drought".into(),
            name: "Drought".into(),
            scope: EventScope::Seasonal,
            lead_time: 0,
            duration: 100,
            death_time: 0,
            frequency: 1.0,
            seasonal_modifiers: [1.0; 4],
            effects: vec![CommodityEffect {
                commodity: "water".into(),
                strength: 10.0,
            }],
        }]
        .into_iter()
        .map(|d| (d.id.clone(), d))
        .collect();

        let mut market = Market::default();
        market.prices.insert("water".into(), flat(10.0));
        market.prices.insert("salt".into(), flat(10.0));

        let mut book = EventBook::new();
        book.start("drought", GameTime::START, &mut rng);
        let modifier = book.active().next().unwrap().random_modifier;

        let mut clock = TimeClock::new();
        let tick = clock.advance(2).unwrap();
        update_market(&mut market, &book, &tick, &defs, &mut rng);

        let water = market.price_of("water", tick.now.hour).unwrap();
        assert!((water - 10.0 * 2.05f64.powf(3.0) * modifier).abs() < 1e-9);
        assert_eq!(market.price_of("salt", tick.now.hour), Some(10.0));
    }

    #[test]
    fn test_multiplier_resets_when_event_gone() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut market = Market::default();
        let mut state = flat(10.0);
        state.events_multiplier = 3.0;
        market.prices.insert("water".into(), state);

        let mut clock = TimeClock::new();
        let tick = clock.advance(1).unwrap();
        update_market(&mut market, &EventBook::new(), &tick, &BTreeMap::new(), &mut rng);
        assert_eq!(market.prices["water"].events_multiplier, 1.0);
    }

    #[test]
    fn test_quote_band() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let state = flat(100.0);
        let mut intel = Intel::default();
        let now = GameTime::START;

        assert_eq!(quote_band(&state, now, &intel, Some(0), 1, &mut rng), PriceBand::exact(100.0));
        assert_eq!(quote_band(&state, now, &intel, None, 1, &mut rng), PriceBand::UNKNOWN);
        assert_eq!(quote_band(&state, now, &intel, Some(5), 1, &mut rng), PriceBand::UNKNOWN);

        let near = quote_band(&state, now, &intel, Some(1), 1, &mut rng);
        assert!(near.min < 100.0 || near.max > 100.0);
        assert!(near.min >= 0.0);

        intel.prices.grant(0, now);
        assert_eq!(quote_band(&state, now, &intel, None, 1, &mut rng), PriceBand::exact(100.0));

        let quote = PriceQuote::new("salt", PriceBand::UNKNOWN);
        assert!(quote.is_unknown());
    }
}
