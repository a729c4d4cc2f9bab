//! Encounter effects.
//!
//! Road encounters resolve into a short list of effects on the party. The
//! set is closed; each variant is handled in one `match`.

use serde::{Deserialize, Serialize};

use crate::clock::GameTime;
use crate::intel::Intel;
use crate::party::Party;
use crate::storage::Item;

/// Which intel window a duration effect extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntelTarget {
    Prices,
    Events,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventEffect {
    /// Gain (positive) or lose (negative) goods from the pending pool.
    Item { commodity: String, count: i32 },
    /// Gain or lose coins.
    Coin { amount: i64 },
    /// Extend intel at the current settlement. Zero hours is permanent.
    Duration { target: IntelTarget, hours: i64 },
    None,
}

/// What an effect actually did, for the encounter log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectOutcome {
    ItemsGained { commodity: String, count: u32 },
    ItemsLost { commodity: String, count: u32 },
    Coins { before: u64, after: u64 },
    IntelExtended(IntelTarget),
    Nothing,
}

impl EventEffect {
    /// Applies the effect. `intel` is the settlement the party is at, if any.
    pub fn apply(&self, party: &mut Party, intel: Option<&mut Intel>, now: GameTime) -> EffectOutcome {
        match self {
            EventEffect::Item { commodity, count } => {
                if *count >= 0 {
                    let count = *count as u32;
                    party.pending.deposit(Item::new(commodity.clone(), count));
                    EffectOutcome::ItemsGained {
                        commodity: commodity.clone(),
                        count,
                    }
                } else {
                    let taken = party.pending.withdraw(commodity, count.unsigned_abs());
                    EffectOutcome::ItemsLost {
                        commodity: commodity.clone(),
                        count: taken,
                    }
                }
            }
            EventEffect::Coin { amount } => {
                let before = party.coins;
                party.adjust_coins(*amount);
                EffectOutcome::Coins {
                    before,
                    after: party.coins,
                }
            }
            EventEffect::Duration { target, hours } => match intel {
                Some(intel) if *hours >= 0 => {
                    let window = match target {
                        IntelTarget::Prices => &mut intel.prices,
                        IntelTarget::Events => &mut intel.events,
                    };
                    window.grant(*hours, now);
                    EffectOutcome::IntelExtended(*target)
                }
                _ => EffectOutcome::Nothing,
            },
            EventEffect::None => EffectOutcome::Nothing,
        }
    }
}
