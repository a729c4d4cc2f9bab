//! Caravan Core - Trading Caravan Simulation Engine
//!
//! An ECS-based simulation of a trading caravan moving between settlements
//! whose markets shift with the days, the seasons, and whatever trouble is
//! brewing locally or across a whole region.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: settlements and the caravan's wagons
//! - **Components**: pure data attached to entities (Settlement, Market, Wagon, ...)
//! - **Systems**: logic that queries and updates components once per tick
//!
//! Pure game rules (grid placement, pricing curves, event phases) live in
//! `caravan-logic`; this crate owns the world, content, time and saves.
//!
//! # Example
//!
//! ```rust,no_run
//! use caravan_core::prelude::*;
//!
//! let mut engine = SimulationEngine::with_bundled_content(SimConfig::default()).unwrap();
//! let wagon = engine.spawn_wagon("Old Bessie");
//!
//! engine.buy("Ashford", "salt", 10).unwrap();
//! engine.advance_time(24);
//! for quote in engine.price_quotes("Caldera") {
//!     println!("{}: {:.1} - {:.1}", quote.item_id, quote.min, quote.max);
//! }
//! # let _ = wagon;
//! ```

pub mod components;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::content::Content;
    pub use crate::engine::{EventSummary, SimulationEngine, TickReport};
    pub use crate::error::{CargoError, TradeError, TravelError};
    pub use crate::systems::{Arrival, PriceQuote};
}
