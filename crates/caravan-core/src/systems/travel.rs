//! Travel system - journeys along roads and arrival encounters
//!
//! A journey is a tween from one settlement's map position to another's,
//! timed at a fixed number of hours per road. The engine samples it each
//! tick to move the wagons and completes it once the time has run out.

use caravan_logic::clock::GameTime;
use caravan_logic::effects::EffectOutcome;
use caravan_logic::grid::Vec3;
use caravan_logic::intel::Intel;
use caravan_logic::party::Party;
use caravan_logic::tween::Tween;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::content::EncounterDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    pub from: String,
    pub to: String,
    /// Settlements passed through, ending with `to`
    pub route: Vec<String>,
    pub tween: Tween<Vec3>,
}

impl Journey {
    pub fn new(
        from: impl Into<String>,
        route: Vec<String>,
        positions: (Vec3, Vec3),
        departure: GameTime,
        hours_per_road: u32,
    ) -> Self {
        let from = from.into();
        let to = route.last().cloned().unwrap_or_else(|| from.clone());
        let hours = hours_per_road as f64 * route.len() as f64;
        Self {
            from,
            to,
            tween: Tween::new(departure.total_hours() as f64, hours, positions.0, positions.1),
            route,
        }
    }

    pub fn roads(&self) -> usize {
        self.route.len()
    }

    pub fn position(&self, now: GameTime) -> Vec3 {
        self.tween.sample(now.total_hours() as f64)
    }

    pub fn has_arrived(&self, now: GameTime) -> bool {
        self.tween.is_finished(now.total_hours() as f64)
    }

    pub fn hours_remaining(&self, now: GameTime) -> f64 {
        self.tween.remaining(now.total_hours() as f64)
    }
}

/// An encounter that fired, with what each of its effects did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encounter {
    pub id: String,
    pub description: String,
    pub outcomes: Vec<EffectOutcome>,
}

/// What happened when a journey ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    pub settlement: String,
    pub at: GameTime,
    pub encounters: Vec<Encounter>,
}

/// Rolls each encounter independently and applies the ones that fire.
pub fn roll_encounters(
    encounters: &[EncounterDef],
    party: &mut Party,
    mut intel: Option<&mut Intel>,
    now: GameTime,
    rng: &mut impl Rng,
) -> Vec<Encounter> {
    let mut fired = Vec::new();
    for def in encounters {
        if rng.gen::<f64>() >= def.chance {
            continue;
        }
        let outcomes = def
            .effects
            .iter()
            .map(|effect| effect.apply(party, intel.as_deref_mut(), now))
            .collect();
        log::info!("Encounter: {}", def.description);
        fired.push(Encounter {
            id: def.id.clone(),
            description: def.description.clone(),
            outcomes,
        });
    }
    fired
}
