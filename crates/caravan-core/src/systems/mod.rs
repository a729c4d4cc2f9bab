//! Systems - logic that operates on components

mod events;
mod market;
mod settlement;
mod travel;

pub use events::*;
pub use market::*;
pub use settlement::*;
pub use travel::*;
