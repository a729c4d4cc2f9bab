//! Settlement tick - intel, event rolls, then phases and prices

use caravan_logic::clock::Tick;
use caravan_logic::events::{EventBook, EventDef, LifecycleChange};
use caravan_logic::intel::Intel;
use hecs::{Entity, World};
use rand::Rng;
use std::collections::BTreeMap;

use crate::components::{Market, Settlement};
use crate::content::ZoneDef;
use crate::systems::{roll_local_events, update_market, zone_event_system, EventNotice};

/// Runs one tick for every settlement in `order`.
///
/// Order matters because all settlements draw from the same random stream.
/// Three passes:
/// 1. each settlement closes lapsed intel windows and rolls its local events;
/// 2. every zone rolls its global events;
/// 3. each settlement ages its events, then prices roll over and pick up
///    the multipliers of everything now running.
///
/// Every roll lands before any phase or price update.
pub fn settlement_system(
    world: &mut World,
    order: &[Entity],
    zones: &[ZoneDef],
    tick: &Tick,
    defs: &BTreeMap<String, EventDef>,
    days_per_year: u32,
    rng: &mut impl Rng,
) -> Vec<EventNotice> {
    let mut notices = Vec::new();

    for &entity in order {
        let Ok((settlement, book, intel)) =
            world.query_one_mut::<(&Settlement, &mut EventBook, &mut Intel)>(entity)
        else {
            log::warn!("Settlement entity {:?} is missing components", entity);
            continue;
        };

        intel.refresh(tick.now);
        for change in roll_local_events(settlement, book, tick, defs, days_per_year, rng) {
            notices.push(notice(settlement, change));
        }
    }

    notices.extend(zone_event_system(world, order, zones, tick, defs, days_per_year, rng));

    for &entity in order {
        let Ok((settlement, market, book)) =
            world.query_one_mut::<(&Settlement, &mut Market, &mut EventBook)>(entity)
        else {
            continue;
        };

        for change in book.advance(tick.now, defs) {
            notices.push(notice(settlement, change));
        }
        update_market(market, book, tick, defs, rng);
    }

    notices
}

fn notice(settlement: &Settlement, change: LifecycleChange) -> EventNotice {
    log::debug!("{}: {:?}", settlement.name, change);
    EventNotice {
        settlement: settlement.name.clone(),
        change,
    }
}
