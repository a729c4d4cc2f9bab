//! Market price formation.
//!
//! Each (settlement, commodity) pair keeps two daily fluctuation multipliers.
//! The displayed price slides from today's to tomorrow's over the day, and
//! is scaled by the product of all event multipliers touching the commodity:
//!
//! ```text
//! price = ((24 - h)/24 * today + h/24 * tomorrow) * events * base
//! ```
//!
//! Without price intel the player sees a band instead of the price. Its
//! width grows with road distance and shrinks with player level.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::HOURS_PER_DAY;

/// Above this uncertainty scale the price is reported as unknowable.
pub const UNKNOWABLE_SCALE: f64 = 40.0;

/// Exponent applied to road distance in the uncertainty scale.
const DISTANCE_EXPONENT: f64 = 2.5;

/// Per-level divisor weight in the uncertainty scale.
const LEVEL_WEIGHT: f64 = 0.6;

/// Price state for one commodity at one settlement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceState {
    pub base_price: f64,
    pub volatility: f64,
    pub todays_multiplier: f64,
    pub tomorrows_multiplier: f64,
    /// Product of active event contributions, rebuilt every tick.
    pub events_multiplier: f64,
}

impl PriceState {
    /// Fresh state with both daily multipliers rolled.
    pub fn new(base_price: f64, volatility: f64, rng: &mut impl Rng) -> Self {
        let volatility = volatility.clamp(0.0, 1.0);
        Self {
            base_price: base_price.max(0.0),
            volatility,
            todays_multiplier: roll_multiplier(volatility, rng),
            tomorrows_multiplier: roll_multiplier(volatility, rng),
            events_multiplier: 1.0,
        }
    }

    /// Applies `days` midnights. One day carries tomorrow into today; a
    /// longer skip re-rolls both with no continuity.
    pub fn advance_days(&mut self, days: u32, rng: &mut impl Rng) {
        match days {
            0 => {}
            1 => {
                self.todays_multiplier = self.tomorrows_multiplier;
                self.tomorrows_multiplier = roll_multiplier(self.volatility, rng);
            }
            _ => {
                self.todays_multiplier = roll_multiplier(self.volatility, rng);
                self.tomorrows_multiplier = roll_multiplier(self.volatility, rng);
            }
        }
    }

    /// Daily fluctuation at `hour`, before events.
    pub fn fluctuation(&self, hour: u32) -> f64 {
        let hours = HOURS_PER_DAY as f64;
        let h = hour.min(HOURS_PER_DAY) as f64;
        (hours - h) / hours * self.todays_multiplier + h / hours * self.tomorrows_multiplier
    }

    pub fn price_per_unit(&self, hour: u32) -> f64 {
        self.fluctuation(hour) * self.events_multiplier * self.base_price
    }
}

/// Uniform multiplier in `[1 - volatility, 1 + volatility]`.
pub fn roll_multiplier(volatility: f64, rng: &mut impl Rng) -> f64 {
    if volatility <= 0.0 {
        1.0
    } else {
        rng.gen_range(1.0 - volatility..=1.0 + volatility)
    }
}

/// What the player is shown for a price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
}

impl PriceBand {
    pub const UNKNOWN: Self = Self { min: -1.0, max: -1.0 };

    pub fn exact(price: f64) -> Self {
        Self {
            min: price,
            max: price,
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }

    pub fn is_exact(&self) -> bool {
        !self.is_unknown() && self.min == self.max
    }
}

/// Uncertainty scale for a price seen from `distance` roads away.
pub fn uncertainty_scale(distance: u32, player_level: u32) -> f64 {
    let level = player_level.max(1) as f64;
    (distance as f64).powf(DISTANCE_EXPONENT) / (level * LEVEL_WEIGHT)
}

/// Estimated band around `true_price`. Contains a random offset, so every
/// call gives a different band; callers must not cache it.
pub fn price_band(true_price: f64, distance: u32, player_level: u32, rng: &mut impl Rng) -> PriceBand {
    let scale = uncertainty_scale(distance, player_level);
    if scale > UNKNOWABLE_SCALE {
        return PriceBand::UNKNOWN;
    }

    let range = scale * true_price.max(0.0).sqrt();
    if range <= 0.0 {
        return PriceBand::exact(true_price);
    }

    let half = range / 2.0;
    let offset = rng.gen_range(-half..=half);
    PriceBand {
        min: (true_price - half + offset).max(0.0),
        max: true_price + half + offset,
    }
}
