//! Component definitions for the ECS simulation.
//!
//! Components are plain data attached to entities. Settlements carry a
//! [`Settlement`], a [`Market`], an `EventBook` and an `Intel`; wagons carry
//! a [`Wagon`]. Behaviour over time lives in systems.

mod settlement;
mod wagon;

pub use settlement::*;
pub use wagon::*;
