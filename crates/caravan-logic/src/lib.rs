//! Pure trading-caravan logic for Caravan.
//!
//! This crate contains the game logic that is independent of any ECS,
//! engine, or runtime. Functions take plain data and return results, making
//! them unit-testable and usable from the simulation engine, the headless
//! harness, and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`clock`] | Day/hour game time, seasons, time ticks |
//! | [`effects`] | Closed set of encounter effects applied to the party |
//! | [`events`] | Event definitions, lead/active/decay curves, per-settlement event book |
//! | [`grid`] | World ↔ grid cell mapping under an arbitrary body orientation |
//! | [`intel`] | Perfect price/event information windows |
//! | [`market`] | Daily price fluctuation, hourly interpolation, fog-of-war price bands |
//! | [`occupancy`] | Which cells are taken by placed modules or loose items |
//! | [`party`] | Player caravan state: purse, level, unassigned goods |
//! | [`placement`] | Bounds clamping, stack resolution, support checks |
//! | [`roads`] | Settlement road graph with BFS distance and routes |
//! | [`storage`] | Module capacity, storage types, item transfer rules |
//! | [`tween`] | Explicit interpolation records advanced by the caller |

pub mod clock;
pub mod effects;
pub mod events;
pub mod grid;
pub mod intel;
pub mod market;
pub mod occupancy;
pub mod party;
pub mod placement;
pub mod roads;
pub mod storage;
pub mod tween;
