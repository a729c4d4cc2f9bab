//! Simulation configuration.

use serde::{Deserialize, Serialize};

/// Tunables that aren't part of the content data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Length of a game year; seasons are a quarter of it.
    pub days_per_year: u32,
    /// Travel time along one road.
    pub hours_per_road: u32,
    pub starting_coins: u64,
    pub starting_level: u32,
    /// Where the caravan starts. `None` picks the first settlement.
    pub starting_settlement: Option<String>,
    /// Fixed RNG seed for reproducible runs (None = random).
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            days_per_year: 120,
            hours_per_road: 8,
            starting_coins: 500,
            starting_level: 1,
            starting_settlement: None,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json(r#"{"days_per_year": 360, "seed": 9}"#).unwrap();
        assert_eq!(config.days_per_year, 360);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.hours_per_road, 8);
    }
}
