//! Event systems: per-settlement lifecycle and zone-wide global events.
//!
//! Local and seasonal events are rolled by each settlement for every day
//! that starts during a tick. Global events are rolled once per zone and,
//! on success, start on every settlement in the zone that allows them.

use caravan_logic::clock::Tick;
use caravan_logic::events::{ActiveEvent, EventBook, EventDef, EventScope, LifecycleChange};
use hecs::{Entity, World};
use rand::Rng;
use std::collections::BTreeMap;

use crate::components::Settlement;
use crate::content::ZoneDef;

/// A lifecycle change at a named settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNotice {
    pub settlement: String,
    pub change: LifecycleChange,
}

/// Rolls the settlement's local events for each new day. Phases are
/// advanced separately, once every event for the tick has been rolled.
pub fn roll_local_events(
    settlement: &Settlement,
    book: &mut EventBook,
    tick: &Tick,
    defs: &BTreeMap<String, EventDef>,
    days_per_year: u32,
    rng: &mut impl Rng,
) -> Vec<LifecycleChange> {
    let mut changes = Vec::new();
    for day in tick.new_days() {
        let candidates = settlement.allowed_events.iter().filter_map(|id| defs.get(id));
        changes.extend(book.roll_daily(candidates, days_per_year, day, rng));
    }
    changes
}

/// Rolls every zone's global events and starts winners across the zone.
///
/// An event already running anywhere in the zone is not rolled again. All
/// settlements that receive it share one instance, so the intensity matches.
pub fn zone_event_system(
    world: &mut World,
    settlements: &[Entity],
    zones: &[ZoneDef],
    tick: &Tick,
    defs: &BTreeMap<String, EventDef>,
    days_per_year: u32,
    rng: &mut impl Rng,
) -> Vec<EventNotice> {
    let mut notices = Vec::new();

    for zone in zones {
        for event_id in &zone.global_events {
            let Some(def) = defs.get(event_id) else {
                continue;
            };
            if def.scope != EventScope::Global {
                continue;
            }

            let eligible: Vec<Entity> = settlements
                .iter()
                .copied()
                .filter(|&e| {
                    world
                        .get::<&Settlement>(e)
                        .map(|s| s.in_zone(&zone.id) && s.allows(event_id))
                        .unwrap_or(false)
                })
                .collect();
            if eligible.is_empty() {
                continue;
            }

            for day in tick.new_days() {
                let running = eligible.iter().any(|&e| {
                    world
                        .get::<&EventBook>(e)
                        .map(|b| b.is_running(event_id))
                        .unwrap_or(false)
                });
                if running {
                    break;
                }
                if rng.gen::<f64>() >= def.daily_chance(days_per_year, day.season(days_per_year)) {
                    continue;
                }

                let instance = ActiveEvent::new(event_id.as_str(), day, rng);
                log::info!("{} breaks out across {} (day {})", def.name, zone.id, day.day);
                for &entity in &eligible {
                    let Ok((settlement, book)) = world.query_one_mut::<(&Settlement, &mut EventBook)>(entity)
                    else {
                        continue;
                    };
                    if book.insert(instance.clone()) {
                        notices.push(EventNotice {
                            settlement: settlement.name.clone(),
                            change: LifecycleChange::Started(event_id.clone()),
                        });
                    }
                }
            }
        }
    }

    notices
}
