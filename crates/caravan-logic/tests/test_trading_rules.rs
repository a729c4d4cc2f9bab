//! Integration tests across the pure-logic modules.
//!
//! Exercises: placement → storage → occupancy when packing a wagon,
//! event book → market when pricing a commodity over an event's life,
//! and roads → fog-of-war bands.

use caravan_logic::clock::{GameTime, TimeClock};
use caravan_logic::events::{full_strength, CommodityEffect, EventBook, EventDef, EventScope};
use caravan_logic::grid::{GridCell, GridSize, ModuleRotation};
use caravan_logic::market::{price_band, PriceState};
use caravan_logic::occupancy::{OccupancyIndex, Placement};
use caravan_logic::placement::{PlacementError, PlacementResolver};
use caravan_logic::roads::{Road, SettlementGraph};
use caravan_logic::storage::{CommodityDef, Item, ItemPool, ModuleType, StorageModule, StorageType};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

// ── Helpers ────────────────────────────────────────────────────────────

const GRID: GridSize = GridSize { x: 4, y: 3, z: 6 };

fn module_type(id: &str, storage_type: StorageType, capacity: u32, footprint: GridSize) -> ModuleType {
    ModuleType {
        id: id.into(),
        name: id.into(),
        capacity,
        storage_type,
        footprint,
        visual: String::new(),
    }
}

fn commodity(id: &str, storage_type: StorageType, unit_size: u32) -> CommodityDef {
    CommodityDef {
        id: id.into(),
        name: id.into(),
        storage_type,
        unit_size,
        base_price: 10.0,
        volatility: 0.1,
        footprint: GridSize::UNIT,
    }
}

/// Resolves a drop at `cell` and places the module if it's valid.
fn drop_module(
    modules: &mut Vec<StorageModule>,
    module_type: &ModuleType,
    cell: GridCell,
    rotation: ModuleRotation,
) -> Result<GridCell, PlacementError> {
    let size = module_type.footprint.oriented(rotation);
    let check = PlacementResolver::new(GRID, modules.as_slice()).evaluate(cell, size);
    check.result?;
    let placement = Placement::new(check.origin, module_type.footprint, rotation);
    modules.push(StorageModule::new(module_type.clone(), placement));
    Ok(check.origin)
}

fn festival() -> EventDef {
    EventDef {
        id: "festival".into(),
        name: "Festival".into(),
        scope: EventScope::Local,
        lead_time: 10,
        duration: 10,
        death_time: 10,
        frequency: 1.0,
        seasonal_modifiers: [1.0; 4],
        effects: vec![CommodityEffect {
            commodity: "wine".into(),
            strength: 5.0,
        }],
    }
}

// ── Packing a wagon ────────────────────────────────────────────────────

#[test]
fn packing_stacks_and_fills() {
    let crate_type = module_type("crate", StorageType::General, 8, GridSize::UNIT);
    let chest_type = module_type("chest", StorageType::General, 36, GridSize::new(2, 1, 2));
    let mut modules = Vec::new();

    // Two crates side by side, a chest bridging them from above is
    // unsupported until the second row is filled
    drop_module(&mut modules, &crate_type, GridCell::new(0, 0, 0), ModuleRotation::Deg0).unwrap();
    drop_module(&mut modules, &crate_type, GridCell::new(1, 0, 0), ModuleRotation::Deg0).unwrap();
    assert_eq!(
        drop_module(&mut modules, &chest_type, GridCell::new(0, 1, 0), ModuleRotation::Deg0),
        Err(PlacementError::Unsupported)
    );
    drop_module(&mut modules, &crate_type, GridCell::new(0, 0, 1), ModuleRotation::Deg0).unwrap();
    drop_module(&mut modules, &crate_type, GridCell::new(1, 0, 1), ModuleRotation::Deg0).unwrap();

    // Dropped at floor level, the chest lands on top of the crates
    let chest_origin =
        drop_module(&mut modules, &chest_type, GridCell::new(0, 0, 0), ModuleRotation::Deg0).unwrap();
    assert_eq!(chest_origin, GridCell::new(0, 1, 0));

    // The crates under the chest can't be pulled out
    let index = OccupancyIndex::new(&modules);
    assert!(index.is_region_occupied_above(&modules[0]));
    assert!(!index.is_region_occupied_above(&modules[4]));

    // Goods fill the chest; the overflow stays in the pool
    let grain = commodity("grain", StorageType::General, 1);
    let iron = commodity("iron", StorageType::General, 3);
    let mut pool = ItemPool::new();
    pool.deposit(Item::new("grain", 30));
    pool.deposit(Item::new("iron", 5));

    let chest = &mut modules[4];
    for def in [&grain, &iron] {
        let Some(source) = pool.get_mut(&def.id) else { continue };
        let _ = chest.add_item(source, def);
    }
    pool.prune();

    // 30 grain + 2 iron (6 volume) = 36
    assert_eq!(chest.used_volume(), 36);
    assert_eq!(chest.count_of("iron"), 2);
    assert_eq!(pool.count_of("grain"), 0);
    assert_eq!(pool.count_of("iron"), 3);
}

#[test]
fn fluids_keep_to_one_kind() {
    let tank = module_type("tank", StorageType::Fluid, 40, GridSize::new(2, 1, 2));
    let mut modules = Vec::new();
    drop_module(&mut modules, &tank, GridCell::new(3, 0, 5), ModuleRotation::Deg90).unwrap();
    // Pushed back inside on both axes
    assert_eq!(modules[0].placement.origin, GridCell::new(2, 0, 4));

    let water = commodity("water", StorageType::Fluid, 1);
    let wine = commodity("wine", StorageType::Fluid, 1);
    let mut source = Item::new("water", 10);
    modules[0].add_item(&mut source, &water).unwrap();
    let mut other = Item::new("wine", 1);
    assert!(modules[0].add_item(&mut other, &wine).is_err());
    assert_eq!(other.count, 1);

    // Empty it and the wine goes in
    let back = modules[0].remove_item(&water, 10, false).unwrap();
    assert_eq!(back, Some(Item::new("water", 10)));
    assert!(modules[0].is_empty());
    modules[0].add_item(&mut other, &wine).unwrap();
    assert_eq!(modules[0].count_of("wine"), 1);
}

// ── Prices over an event's life ────────────────────────────────────────

#[test]
fn event_lifecycle_moves_prices() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut defs = BTreeMap::new();
    defs.insert("festival".to_string(), festival());

    let mut book = EventBook::new();
    let mut clock = TimeClock::new();
    let mut wine = PriceState::new(20.0, 0.0, &mut rng);
    assert!(book.start("festival", clock.now(), &mut rng));
    let modifier = book.running().next().unwrap().random_modifier;
    let full = full_strength(5.0, modifier);

    let mut samples = Vec::new();
    for _ in 0..32 {
        let Some(tick) = clock.advance(1) else { continue };
        book.advance(tick.now, &defs);
        wine.advance_days(tick.days_elapsed(), &mut rng);
        wine.events_multiplier = book.commodity_multiplier("wine", tick.now, &defs, &mut rng);
        samples.push(wine.price_per_unit(tick.now.hour));
    }

    // Lead: rising toward full strength
    let at_5 = samples[4];
    assert!(at_5 > 20.0 && at_5 < 20.0 * full);
    // Active: exactly full strength (no volatility)
    let at_15 = samples[14];
    assert!((at_15 - 20.0 * full).abs() < 1e-9);
    // Decay: halfway back at hour 25
    let at_25 = samples[24];
    let expected = 20.0 * (0.5 * full + 0.5);
    assert!((at_25 - expected).abs() < 1e-9);
    // Over: base price again
    let at_30 = samples[29];
    assert_eq!(at_30, 20.0);
    assert!(book.is_empty());
}

#[test]
fn day_skip_carries_or_rerolls() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut state = PriceState::new(10.0, 0.2, &mut rng);
    let tomorrow = state.tomorrows_multiplier;
    state.advance_days(1, &mut rng);
    assert_eq!(state.todays_multiplier, tomorrow);

    // Prices slide continuously across a single midnight
    let end_of_day = state.price_per_unit(24);
    state.advance_days(1, &mut rng);
    assert!((state.price_per_unit(0) - end_of_day).abs() < 1e-9);

    // Long skips stay in the volatility range
    state.advance_days(5, &mut rng);
    for m in [state.todays_multiplier, state.tomorrows_multiplier] {
        assert!((0.8..=1.2).contains(&m));
    }
}

// ── Fog of war over a road network ─────────────────────────────────────

#[test]
fn bands_widen_with_distance() {
    let graph = SettlementGraph::from_roads(&[
        Road::new("A", "B"),
        Road::new("B", "C"),
        Road::new("C", "D"),
        Road::new("D", "E"),
    ]);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let price = 25.0;

    let mut last_width = 0.0;
    for town in ["B", "C"] {
        let distance = graph.distance("A", town).unwrap();
        let band = price_band(price, distance, 1, &mut rng);
        assert!(band.min <= price && price <= band.max);
        let width = band.max - band.min;
        assert!(width > last_width);
        last_width = width;
    }

    assert_eq!(graph.distance("A", "E"), Some(4));
    assert!(price_band(price, 4, 1, &mut rng).is_unknown());
    assert!(!price_band(price, 4, 2, &mut rng).is_unknown());
    assert!(price_band(price, 0, 1, &mut rng).is_exact());
    assert_eq!(graph.route("A", "D").unwrap(), vec!["B", "C", "D"]);
}

#[test]
fn clock_days_and_ticks() {
    let mut clock = TimeClock::starting_at(GameTime::new(1, 20));
    let tick = clock.advance(30).unwrap();
    assert_eq!(tick.now, GameTime::new(3, 2));
    assert_eq!(tick.days_elapsed(), 2);
    assert_eq!(
        tick.new_days().collect::<Vec<_>>(),
        vec![GameTime::new(2, 0), GameTime::new(3, 0)]
    );
    assert!(clock.advance(0).is_none());
}
