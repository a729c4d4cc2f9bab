//! Errors returned by engine commands. Messages are shown to the player.

use caravan_logic::placement::PlacementError;
use caravan_logic::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    #[error("There is no settlement called '{0}'.")]
    UnknownSettlement(String),
    #[error("You need to be in {0} to trade there.")]
    NotHere(String),
    #[error("{settlement} doesn't trade {commodity}.")]
    NotTraded { commodity: String, settlement: String },
    #[error("That costs {cost} coins and you have {coins}.")]
    CannotAfford { cost: u64, coins: u64 },
    #[error("You only have {available} {commodity} to sell (asked for {requested}).")]
    NotEnoughGoods {
        commodity: String,
        available: u32,
        requested: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TravelError {
    #[error("There is no settlement called '{0}'.")]
    UnknownSettlement(String),
    #[error("The caravan is already on the road.")]
    AlreadyTravelling,
    #[error("You are already in {0}.")]
    AlreadyThere(String),
    #[error("No road leads to {0} from here.")]
    Unreachable(String),
}

/// Wagon and cargo commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CargoError {
    #[error("That wagon doesn't exist.")]
    NoSuchWagon,
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
