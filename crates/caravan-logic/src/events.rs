//! Settlement events: droughts, festivals, bandit raids and the like.
//!
//! An event instance goes through three phases measured in hours since it
//! started:
//!
//! | Phase | Window | Multiplier |
//! |-------|--------|------------|
//! | Lead | `[0, lead)` | blends from 1.0 toward full strength, with ±5% jitter |
//! | Active | `[lead, lead + duration)` | full strength |
//! | Decay | `[lead + duration, lead + duration + death)` | blends back to 1.0 |
//!
//! Full strength for a commodity effect is `2.05^(0.3 × strength) × m`
//! where `m` is the instance's random modifier in `[0.8, 1.2]`.
//!
//! [`EventBook`] keeps a settlement's instances in two maps, active and
//! decaying. An instance lives in exactly one of them.

use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::clock::{GameTime, Season};

/// Base of the strength curve.
const STRENGTH_BASE: f64 = 2.05;
/// Exponent weight per strength point.
const STRENGTH_WEIGHT: f64 = 0.3;
/// Strength is clamped to ±this on load.
pub const MAX_STRENGTH: f64 = 10.0;
/// Range of the per-instance intensity modifier.
pub const RANDOM_MODIFIER_RANGE: (f64, f64) = (0.8, 1.2);
/// Range of the per-tick lead-in jitter.
const LEAD_JITTER_RANGE: (f64, f64) = (0.95, 1.05);

/// Who rolls an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventScope {
    /// Rolled by each settlement on its own.
    #[default]
    Local,
    /// Rolled locally; only the seasonal modifiers make it likely.
    Seasonal,
    /// Rolled per zone and started on every settlement in it.
    Global,
}

/// How an event pushes one commodity's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityEffect {
    pub commodity: String,
    /// -10 (price collapses) to 10 (price soars).
    pub strength: f64,
}

/// Static event definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub scope: EventScope,
    /// Hours of build-up.
    pub lead_time: u32,
    /// Hours at full strength.
    pub duration: u32,
    /// Hours to fade back to normal.
    pub death_time: u32,
    /// Expected occurrences per year before seasonal scaling.
    pub frequency: f64,
    /// Occurrence weight per season (spring, summer, autumn, winter).
    pub seasonal_modifiers: [f64; 4],
    pub effects: Vec<CommodityEffect>,
}

impl EventDef {
    /// Probability of starting on a given day.
    pub fn daily_chance(&self, days_per_year: u32, season: Season) -> f64 {
        self.frequency / days_per_year.max(1) as f64 * self.seasonal_modifiers[season.index()]
    }

    /// Hours from start until decay begins.
    pub fn decay_from(&self) -> u32 {
        self.lead_time.saturating_add(self.duration)
    }

    /// Hours from start until the instance is dropped.
    pub fn lifetime(&self) -> u32 {
        self.decay_from().saturating_add(self.death_time)
    }

    pub fn strength_for(&self, commodity: &str) -> Option<f64> {
        self.effects
            .iter()
            .find(|e| e.commodity == commodity)
            .map(|e| e.strength)
    }

    /// Clamps effect strengths into range. Returns how many were changed.
    pub fn sanitize(&mut self) -> usize {
        let mut clamped = 0;
        for effect in &mut self.effects {
            let s = effect.strength.clamp(-MAX_STRENGTH, MAX_STRENGTH);
            if s != effect.strength {
                effect.strength = s;
                clamped += 1;
            }
        }
        clamped
    }

    pub fn phase_at(&self, elapsed_hours: i64) -> EventPhase {
        let elapsed = u32::try_from(elapsed_hours.max(0)).unwrap_or(u32::MAX);
        let decay_from = self.decay_from();
        if elapsed < self.lead_time {
            EventPhase::Lead { elapsed }
        } else if elapsed < decay_from {
            EventPhase::Active
        } else if elapsed < self.lifetime() {
            EventPhase::Decaying {
                elapsed: elapsed - decay_from,
            }
        } else {
            EventPhase::Over
        }
    }
}

/// Where an instance is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Lead { elapsed: u32 },
    Active,
    Decaying { elapsed: u32 },
    Over,
}

/// Multiplier at full strength.
pub fn full_strength(strength: f64, random_modifier: f64) -> f64 {
    STRENGTH_BASE.powf(STRENGTH_WEIGHT * strength) * random_modifier
}

/// One running event at one settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub event_id: String,
    pub start: GameTime,
    pub random_modifier: f64,
    pub visible: bool,
}

impl ActiveEvent {
    pub fn new(event_id: impl Into<String>, start: GameTime, rng: &mut impl Rng) -> Self {
        let (lo, hi) = RANDOM_MODIFIER_RANGE;
        Self {
            event_id: event_id.into(),
            start,
            random_modifier: rng.gen_range(lo..=hi),
            visible: false,
        }
    }

    pub fn elapsed_hours(&self, now: GameTime) -> i64 {
        now.hours_since(self.start)
    }

    /// This instance's contribution to a commodity with `strength`.
    pub fn multiplier(&self, def: &EventDef, strength: f64, now: GameTime, rng: &mut impl Rng) -> f64 {
        let full = full_strength(strength, self.random_modifier);
        match def.phase_at(self.elapsed_hours(now)) {
            EventPhase::Lead { elapsed } => {
                let lead = def.lead_time as f64;
                let t = elapsed as f64;
                let (lo, hi) = LEAD_JITTER_RANGE;
                (t / lead * full + (lead - t) / lead) * rng.gen_range(lo..=hi)
            }
            EventPhase::Active => full,
            EventPhase::Decaying { elapsed } => {
                let death = def.death_time as f64;
                let t = elapsed as f64;
                (death - t) / death * full + t / death
            }
            EventPhase::Over => 1.0,
        }
    }
}

/// Lifecycle change reported by [`EventBook::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleChange {
    Started(String),
    Decaying(String),
    Ended(String),
}

/// A settlement's running events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBook {
    active: BTreeMap<String, ActiveEvent>,
    decaying: BTreeMap<String, ActiveEvent>,
}

impl EventBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active or decaying.
    pub fn is_running(&self, event_id: &str) -> bool {
        self.active.contains_key(event_id) || self.decaying.contains_key(event_id)
    }

    pub fn active(&self) -> impl Iterator<Item = &ActiveEvent> {
        self.active.values()
    }

    pub fn decaying(&self) -> impl Iterator<Item = &ActiveEvent> {
        self.decaying.values()
    }

    pub fn running(&self) -> impl Iterator<Item = &ActiveEvent> {
        self.active.values().chain(self.decaying.values())
    }

    pub fn is_active(&self, event_id: &str) -> bool {
        self.active.contains_key(event_id)
    }

    pub fn is_decaying(&self, event_id: &str) -> bool {
        self.decaying.contains_key(event_id)
    }

    /// Starts an instance unless one is already running.
    pub fn start(&mut self, event_id: &str, now: GameTime, rng: &mut impl Rng) -> bool {
        if self.is_running(event_id) {
            return false;
        }
        self.active
            .insert(event_id.to_string(), ActiveEvent::new(event_id, now, rng));
        true
    }

    /// Inserts a prepared instance (used by save/load and tests).
    pub fn insert(&mut self, event: ActiveEvent) -> bool {
        if self.is_running(&event.event_id) {
            return false;
        }
        self.active.insert(event.event_id.clone(), event);
        true
    }

    /// Moves instances through their phases. Instances whose definition is
    /// missing are dropped.
    pub fn advance(&mut self, now: GameTime, defs: &BTreeMap<String, EventDef>) -> Vec<LifecycleChange> {
        let mut changes = Vec::new();

        let expired: Vec<String> = self
            .active
            .values()
            .filter(|e| match defs.get(&e.event_id) {
                Some(def) => e.elapsed_hours(now) >= def.decay_from() as i64,
                None => true,
            })
            .map(|e| e.event_id.clone())
            .collect();
        for id in expired {
            if let Some(event) = self.active.remove(&id) {
                if defs.contains_key(&id) {
                    self.decaying.insert(id.clone(), event);
                    changes.push(LifecycleChange::Decaying(id));
                } else {
                    log::warn!("Dropping running event '{}': no definition", id);
                    changes.push(LifecycleChange::Ended(id));
                }
            }
        }

        let ended: Vec<String> = self
            .decaying
            .values()
            .filter(|e| match defs.get(&e.event_id) {
                Some(def) => e.elapsed_hours(now) >= def.lifetime() as i64,
                None => true,
            })
            .map(|e| e.event_id.clone())
            .collect();
        for id in ended {
            self.decaying.remove(&id);
            changes.push(LifecycleChange::Ended(id));
        }

        changes
    }

    /// Daily roll for each eligible event not already running.
    pub fn roll_daily<'d>(
        &mut self,
        candidates: impl IntoIterator<Item = &'d EventDef>,
        days_per_year: u32,
        now: GameTime,
        rng: &mut impl Rng,
    ) -> Vec<LifecycleChange> {
        let season = now.season(days_per_year);
        let mut started = Vec::new();
        for def in candidates {
            if def.scope == EventScope::Global || self.is_running(&def.id) {
                continue;
            }
            if rng.gen::<f64>() < def.daily_chance(days_per_year, season) {
                self.start(&def.id, now, rng);
                started.push(LifecycleChange::Started(def.id.clone()));
            }
        }
        started
    }

    /// Product of every running event's contribution to `commodity`.
    pub fn commodity_multiplier(
        &self,
        commodity: &str,
        now: GameTime,
        defs: &BTreeMap<String, EventDef>,
        rng: &mut impl Rng,
    ) -> f64 {
        self.running()
            .filter_map(|event| {
                let def = defs.get(&event.event_id)?;
                let strength = def.strength_for(commodity)?;
                Some(event.multiplier(def, strength, now, rng))
            })
            .product()
    }

    /// Marks one instance visible. Returns false if it isn't running.
    pub fn reveal(&mut self, event_id: &str) -> bool {
        match self
            .active
            .get_mut(event_id)
            .or_else(|| self.decaying.get_mut(event_id))
        {
            Some(event) => {
                event.visible = true;
                true
            }
            None => false,
        }
    }

    /// Reveals a random hidden active instance.
    pub fn reveal_random(&mut self, rng: &mut impl Rng) -> Option<String> {
        let event = self.active.values_mut().filter(|e| !e.visible).choose(rng)?;
        event.visible = true;
        Some(event.event_id.clone())
    }

    /// Instances the player can see, oldest first.
    pub fn visible(&self, reveal_all: bool) -> Vec<&ActiveEvent> {
        let mut events: Vec<&ActiveEvent> = self
            .running()
            .filter(|e| reveal_all || e.visible)
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start).then(a.event_id.cmp(&b.event_id)));
        events
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.decaying.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
