//! Caravan Headless Simulation Harness
//!
//! Validates the bundled content and drives the simulation engine through
//! scripted scenarios. Runs entirely in-process with no rendering.
//!
//! Usage:
//!   cargo run -p caravan-simtest
//!   cargo run -p caravan-simtest -- --verbose
//!   cargo run -p caravan-simtest -- --seed 7

use caravan_core::content::Content;
use caravan_core::prelude::*;
use caravan_logic::clock::{GameTime, Season};
use caravan_logic::events::{EventPhase, EventScope, LifecycleChange};
use caravan_logic::grid::{GridCell, GridSize, ModuleRotation, Vec3};
use caravan_logic::market::{uncertainty_scale, UNKNOWABLE_SCALE};
use caravan_logic::occupancy::Placement;
use caravan_logic::placement::{PlacementError, PlacementResolver};
use caravan_logic::roads::SettlementGraph;
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn seed_arg() -> u64 {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--seed")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(42)
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let seed = seed_arg();
    println!("=== Caravan Simulation Harness (seed {}) ===\n", seed);

    let content = match Content::bundled() {
        Ok(content) => content,
        Err(e) => {
            println!("  ✗ content_parse: {}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Loaded {} settlements, {} events, {} module types",
        content.settlements.len(),
        content.events.len(),
        content.module_types.len()
    );

    let mut results = Vec::new();

    // 1. Bundled content cross-references
    results.extend(validate_content(&content, verbose));

    // 2. Road network
    results.extend(validate_roads(&content, verbose));

    // 3. Event definitions and phase curves
    results.extend(validate_events(&content, verbose));

    // 4. Wagon grid placement
    results.extend(validate_placement(&content, verbose));

    // 5. A year of markets
    results.extend(validate_market_year(&content, seed, verbose));

    // 6. A trade run with travel, cargo and a save in the middle
    results.extend(validate_trade_run(&content, seed, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Content ──────────────────────────────────────────────────────────

fn validate_content(content: &Content, verbose: bool) -> Vec<TestResult> {
    println!("--- Content ---");
    let mut results = Vec::new();

    results.push(TestResult::new(
        "content_not_empty",
        !content.commodities.is_empty() && !content.settlements.is_empty(),
        format!(
            "{} commodities, {} module types, {} events, {} settlements",
            content.commodities.len(),
            content.module_types.len(),
            content.events.len(),
            content.settlements.len()
        ),
    ));

    let bad_prices: Vec<_> = content
        .commodities
        .values()
        .filter(|c| c.base_price <= 0.0 || c.unit_size == 0)
        .map(|c| c.id.as_str())
        .collect();
    results.push(TestResult::new(
        "commodities_well_formed",
        bad_prices.is_empty(),
        if bad_prices.is_empty() {
            "all commodities have a price and a unit size".to_string()
        } else {
            format!("bad: {:?}", bad_prices)
        },
    ));

    // Every storage type that goods need must have a module to hold it
    let unstorable: Vec<_> = content
        .commodities
        .values()
        .filter(|c| {
            !content
                .module_types
                .values()
                .any(|m| m.storage_type == c.storage_type && m.capacity >= c.unit_size)
        })
        .map(|c| c.id.as_str())
        .collect();
    results.push(TestResult::new(
        "every_commodity_storable",
        unstorable.is_empty(),
        if unstorable.is_empty() {
            "every commodity fits some module".to_string()
        } else {
            format!("no module for {:?}", unstorable)
        },
    ));

    let grid = Wagon::standard_layout().size;
    let oversized: Vec<_> = content
        .module_types
        .values()
        .filter(|m| !grid.fits(GridCell::ORIGIN, m.footprint) && !grid.fits(GridCell::ORIGIN, m.footprint.rotated()))
        .map(|m| m.id.as_str())
        .collect();
    results.push(TestResult::new(
        "modules_fit_standard_wagon",
        oversized.is_empty(),
        format!("{} module types checked against a {:?} grid", content.module_types.len(), grid),
    ));

    let unknown_listings: Vec<_> = content
        .settlements
        .iter()
        .flat_map(|s| s.market.iter().map(move |l| (s.name.as_str(), l.commodity.as_str())))
        .filter(|(_, commodity)| content.commodity(commodity).is_none())
        .collect();
    results.push(TestResult::new(
        "market_listings_known",
        unknown_listings.is_empty(),
        format!("unknown listings: {:?}", unknown_listings),
    ));

    let bad_chances: Vec<_> = content
        .encounters
        .iter()
        .filter(|e| !(0.0..=1.0).contains(&e.chance))
        .map(|e| e.id.as_str())
        .collect();
    results.push(TestResult::new(
        "encounter_chances_valid",
        bad_chances.is_empty(),
        format!("{} encounters", content.encounters.len()),
    ));

    if verbose {
        for s in &content.settlements {
            println!(
                "  {:<12} zone {:<10} trades {}",
                s.name,
                s.zone.as_deref().unwrap_or("-"),
                s.market.len()
            );
        }
    }

    results
}

// ── 2. Roads ────────────────────────────────────────────────────────────

fn validate_roads(content: &Content, verbose: bool) -> Vec<TestResult> {
    println!("--- Roads ---");
    let mut results = Vec::new();
    let graph = SettlementGraph::from_roads(&content.roads);

    let dangling: Vec<_> = content
        .roads
        .iter()
        .flat_map(|r| [r.a.as_str(), r.b.as_str()])
        .filter(|name| content.settlement(name).is_none())
        .collect();
    results.push(TestResult::new(
        "roads_reference_settlements",
        dangling.is_empty(),
        format!("{} roads, dangling ends: {:?}", content.roads.len(), dangling),
    ));

    let Some(home) = content.settlements.first() else {
        return results;
    };
    let unreachable: Vec<_> = content
        .settlements
        .iter()
        .filter(|s| graph.distance(&home.name, &s.name).is_none())
        .map(|s| s.name.as_str())
        .collect();
    results.push(TestResult::new(
        "all_settlements_connected",
        unreachable.is_empty(),
        format!("unreachable from {}: {:?}", home.name, unreachable),
    ));

    // Routes agree with distances
    let mut mismatches = 0;
    for s in &content.settlements {
        let distance = graph.distance(&home.name, &s.name);
        let route = graph.route(&home.name, &s.name);
        let route_len = route.map(|r| r.len() as u32);
        if distance != route_len {
            mismatches += 1;
        }
        if verbose {
            println!("  {} → {}: {:?} roads", home.name, s.name, distance);
        }
    }
    results.push(TestResult::new(
        "routes_match_distances",
        mismatches == 0,
        format!("{} mismatches", mismatches),
    ));

    // Fog of war: somewhere should be beyond a novice's reach
    let max_distance = content
        .settlements
        .iter()
        .filter_map(|s| graph.distance(&home.name, &s.name))
        .max()
        .unwrap_or(0);
    let scale = uncertainty_scale(max_distance, 1);
    results.push(TestResult::new(
        "fog_of_war_has_horizon",
        scale > UNKNOWABLE_SCALE,
        format!("furthest settlement {} roads, scale {:.1}", max_distance, scale),
    ));

    results
}

// ── 3. Events ───────────────────────────────────────────────────────────

fn validate_events(content: &Content, verbose: bool) -> Vec<TestResult> {
    println!("--- Events ---");
    let mut results = Vec::new();
    let days_per_year = SimConfig::default().days_per_year;

    let mut missing = Vec::new();
    for s in &content.settlements {
        for id in &s.allowed_events {
            if content.event(id).is_none() {
                missing.push(format!("{}:{}", s.name, id));
            }
        }
    }
    for zone in &content.zones {
        for id in &zone.global_events {
            match content.event(id) {
                Some(def) if def.scope == EventScope::Global => {}
                _ => missing.push(format!("zone {}:{}", zone.id, id)),
            }
        }
    }
    results.push(TestResult::new(
        "event_references_resolve",
        missing.is_empty(),
        format!("bad references: {:?}", missing),
    ));

    let bad_chance: Vec<_> = content
        .events
        .values()
        .filter(|def| {
            Season::ALL
                .iter()
                .any(|&season| !(0.0..=1.0).contains(&def.daily_chance(days_per_year, season)))
        })
        .map(|def| def.id.as_str())
        .collect();
    results.push(TestResult::new(
        "daily_chances_are_probabilities",
        bad_chance.is_empty(),
        format!("out of range: {:?}", bad_chance),
    ));

    // Phase sequence for every definition
    let mut bad_phases = Vec::new();
    for def in content.events.values() {
        let lead = def.lead_time as i64;
        let active_end = lead + def.duration as i64;
        let lifetime = def.lifetime() as i64;
        let expected = [
            (0, if lead > 0 { EventPhase::Lead { elapsed: 0 } } else { EventPhase::Active }),
            (active_end, if lifetime > active_end { EventPhase::Decaying { elapsed: 0 } } else { EventPhase::Over }),
            (lifetime, EventPhase::Over),
        ];
        for (hour, phase) in expected {
            let got = def.phase_at(hour);
            if std::mem::discriminant(&got) != std::mem::discriminant(&phase) {
                bad_phases.push(format!("{}@{}h: {:?}", def.id, hour, got));
            }
        }
        if verbose {
            println!(
                "  {:<18} {:?} lead {}h, active {}h, decay {}h",
                def.id, def.scope, def.lead_time, def.duration, def.death_time
            );
        }
    }
    results.push(TestResult::new(
        "event_phase_sequence",
        bad_phases.is_empty(),
        format!("unexpected phases: {:?}", bad_phases),
    ));

    results
}

// ── 4. Placement ────────────────────────────────────────────────────────

fn validate_placement(content: &Content, verbose: bool) -> Vec<TestResult> {
    println!("--- Placement ---");
    let mut results = Vec::new();
    let grid = GridSize::new(4, 3, 6);

    // Fill the floor with 1x1x1 blocks, then stack a second layer
    let mut placed: Vec<Placement> = Vec::new();
    let mut failures = 0;
    for layer in 0..2 {
        for x in 0..grid.x {
            for z in 0..grid.z {
                let check = PlacementResolver::new(grid, &placed).evaluate(GridCell::new(x, 0, z), GridSize::UNIT);
                match check.result {
                    Ok(()) if check.origin.y == layer => {
                        placed.push(Placement::new(check.origin, GridSize::UNIT, ModuleRotation::Deg0));
                    }
                    _ => failures += 1,
                }
            }
        }
    }
    results.push(TestResult::new(
        "stacking_fills_layers",
        failures == 0 && placed.len() == (grid.x * grid.z * 2) as usize,
        format!("{} blocks placed, {} failures", placed.len(), failures),
    ));

    // The top layer is reachable, then the grid is full
    let top = PlacementResolver::new(grid, &placed).evaluate(GridCell::new(0, 0, 0), GridSize::UNIT);
    placed.push(Placement::new(top.origin, GridSize::UNIT, ModuleRotation::Deg0));
    let full = PlacementResolver::new(grid, &placed).evaluate(GridCell::new(0, 0, 0), GridSize::UNIT);
    results.push(TestResult::new(
        "stack_tops_out",
        top.origin.y == 2 && full.result == Err(PlacementError::OutOfBounds),
        format!("top at y={}, then {:?}", top.origin.y, full.result),
    ));

    // A wide module over a gap is unsupported
    let floor = vec![Placement::new(GridCell::ORIGIN, GridSize::UNIT, ModuleRotation::Deg0)];
    let bridge = PlacementResolver::new(grid, &floor).evaluate(GridCell::new(0, 1, 0), GridSize::new(2, 1, 1));
    results.push(TestResult::new(
        "overhang_rejected",
        bridge.result == Err(PlacementError::Unsupported),
        format!("{:?} at {:?}", bridge.result, bridge.origin),
    ));

    // Every module type placed at every cell of an empty wagon yields an in-bounds origin
    let mut escaped = 0;
    let mut checks = 0;
    for module in content.module_types.values() {
        for rotation in [ModuleRotation::Deg0, ModuleRotation::Deg90] {
            let size = module.footprint.oriented(rotation);
            let resolver = PlacementResolver::<Placement>::new(grid, &[]);
            for x in -1..=grid.x {
                for z in -1..=grid.z {
                    checks += 1;
                    let check = resolver.evaluate(GridCell::new(x, 0, z), size);
                    if check.is_valid() && !grid.fits(check.origin, size) {
                        escaped += 1;
                    }
                }
            }
        }
    }
    results.push(TestResult::new(
        "clamped_origins_in_bounds",
        escaped == 0,
        format!("{} candidate drops, {} escaped the grid", checks, escaped),
    ));

    // World round trip through a turned wagon
    let mut wagon = Wagon::new("probe", Wagon::standard_layout());
    wagon.body_position = Vec3::new(12.0, 0.0, -4.0);
    wagon.body_rotation = caravan_logic::grid::Quat::from_yaw(std::f32::consts::FRAC_PI_2);
    let frame = wagon.frame();
    let mut round_trip_errors = 0;
    for x in 0..grid.x {
        for y in 0..grid.y {
            for z in 0..grid.z {
                let cell = GridCell::new(x, y, z);
                if frame.world_to_grid(frame.grid_to_world(cell)) != cell {
                    round_trip_errors += 1;
                }
            }
        }
    }
    results.push(TestResult::new(
        "grid_world_round_trip",
        round_trip_errors == 0,
        format!("{} cells off after a round trip", round_trip_errors),
    ));

    if verbose {
        println!("  grid {:?}, {} occupants at the end", grid, placed.len());
    }

    results
}

// ── 5. Market year ──────────────────────────────────────────────────────

fn validate_market_year(content: &Content, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Market Year ---");
    let mut results = Vec::new();
    let config = SimConfig::default().with_seed(seed);
    let days = config.days_per_year;
    let mut engine = SimulationEngine::new(config, content.clone());
    engine.grant_price_info("Ashford", 0);

    let mut started: BTreeMap<String, u32> = BTreeMap::new();
    let mut bad_prices = Vec::new();
    let mut min_seen = f64::MAX;
    let mut max_seen = 0.0f64;

    for _ in 0..days {
        let report = engine.advance_time(24);
        for notice in &report.events {
            if let LifecycleChange::Started(id) = &notice.change {
                *started.entry(id.clone()).or_default() += 1;
            }
        }
        for name in engine.settlement_names() {
            let Some(def) = content.settlement(&name) else { continue };
            for listing in &def.market {
                match engine.price_of(&name, &listing.commodity) {
                    Some(price) if price.is_finite() && price > 0.0 => {
                        min_seen = min_seen.min(price);
                        max_seen = max_seen.max(price);
                    }
                    other => bad_prices.push(format!("{}:{} = {:?}", name, listing.commodity, other)),
                }
            }
        }
    }

    results.push(TestResult::new(
        "prices_positive_all_year",
        bad_prices.is_empty(),
        format!("range {:.2}..{:.2}, {} bad", min_seen, max_seen, bad_prices.len()),
    ));

    let total: u32 = started.values().sum();
    results.push(TestResult::new(
        "events_happen",
        total > 0,
        format!("{} event starts across {} kinds", total, started.len()),
    ));

    results.push(TestResult::new(
        "clock_after_a_year",
        engine.now() == GameTime::new(days + 1, 0),
        format!("now {}", engine.now()),
    ));

    let exact = engine.price_quotes("Ashford").iter().all(|q| q.min == q.max);
    results.push(TestResult::new(
        "permanent_intel_survives_year",
        exact,
        "Ashford quotes still exact",
    ));

    if verbose {
        for (id, count) in &started {
            println!("  {:<18} started {} times", id, count);
        }
    }

    results
}

// ── 6. Trade run ────────────────────────────────────────────────────────

fn validate_trade_run(content: &Content, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Trade Run ---");
    let mut results = Vec::new();
    let mut engine = SimulationEngine::new(SimConfig::default().with_seed(seed), content.clone());
    let wagon = engine.spawn_wagon("Old Bessie");

    let placed = engine
        .place_module(wagon, "crate_long", GridCell::ORIGIN, ModuleRotation::Deg0)
        .and_then(|_| engine.place_module(wagon, "barrel", GridCell::new(3, 0, 0), ModuleRotation::Deg0));
    results.push(TestResult::new(
        "outfit_wagon",
        placed.is_ok(),
        format!("{:?}", placed),
    ));

    let bought = engine.buy("Ashford", "salt", 10);
    let loaded = engine.load_item(wagon, GridCell::ORIGIN, "salt", 10);
    results.push(TestResult::new(
        "buy_and_load",
        bought.is_ok() && matches!(loaded, Ok(ref t) if t.moved == 10) && engine.cargo_count("salt") == 10,
        format!("cost {:?}, transfer {:?}, coins left {}", bought, loaded, engine.party.coins),
    ));

    let journey = engine.travel_to("Caldera").map(|j| j.roads());
    let hours = journey
        .as_ref()
        .map(|&roads| roads as u32 * engine.config().hours_per_road)
        .unwrap_or(0);
    engine.advance_time(hours as i64 / 2);

    let mut saved = Vec::new();
    let save_ok = engine.save(&mut saved).is_ok();
    let mut resumed = SimulationEngine::new(SimConfig::default().with_seed(seed + 1), content.clone());
    let load = resumed.load(saved.as_slice());
    results.push(TestResult::new(
        "save_mid_journey",
        save_ok && load.is_ok() && resumed.now() == engine.now() && resumed.journey() == engine.journey(),
        format!("{} bytes, load {:?}", saved.len(), load.as_ref().map(|_| ())),
    ));

    let report = resumed.advance_time(hours as i64 - hours as i64 / 2);
    let arrived = report.arrival.as_ref().map(|a| a.settlement.as_str()) == Some("Caldera");
    results.push(TestResult::new(
        "arrive_after_resume",
        arrived && resumed.location() == Some("Caldera"),
        format!("{:?} roads, arrival {:?}", journey, report.arrival.as_ref().map(|a| a.at)),
    ));

    let wagon = resumed.wagons().first().copied();
    let unloaded = wagon.map(|w| resumed.unload_item(w, GridCell::ORIGIN, "salt", 10, false));
    let pending = resumed.party.pending.count_of("salt");
    let sold = resumed.sell("Caldera", "salt", pending);
    results.push(TestResult::new(
        "unload_and_sell",
        matches!(unloaded, Some(Ok(_))) && sold.is_ok() && resumed.party.pending.count_of("salt") == 0,
        format!("sold {} salt for {:?}, coins now {}", pending, sold, resumed.party.coins),
    ));

    if verbose {
        if let Some(arrival) = &report.arrival {
            for encounter in &arrival.encounters {
                println!("  encounter: {} - {}", encounter.id, encounter.description);
            }
        }
    }

    results
}
