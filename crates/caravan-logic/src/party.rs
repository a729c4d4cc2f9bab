//! The player's caravan: purse, trade level, and unassigned goods.

use serde::{Deserialize, Serialize};

use crate::storage::ItemPool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Party {
    pub coins: u64,
    /// Trade experience level; higher levels narrow price estimates.
    pub level: u32,
    /// Goods bought or unloaded but not yet stowed in a module.
    pub pending: ItemPool,
}

impl Party {
    pub fn new(coins: u64, level: u32) -> Self {
        Self {
            coins,
            level,
            pending: ItemPool::new(),
        }
    }

    /// Adds (or with a negative amount, removes) coins, floored at zero.
    pub fn adjust_coins(&mut self, amount: i64) {
        self.coins = self.coins.saturating_add_signed(amount);
    }

    pub fn can_afford(&self, cost: u64) -> bool {
        self.coins >= cost
    }
}
