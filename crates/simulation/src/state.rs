//! Simulation configuration and results.

use crate::error::SimulationError;
use clmm_vault_domain::U256;
use serde::{Deserialize, Serialize};

/// Configuration for a swap run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Trades per run.
    pub swaps: usize,
    /// Probability a trade sells token0.
    pub zero_for_one_probability: f64,
    /// Seed for the random number generator.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            swaps: 100,
            zero_for_one_probability: 0.5,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Sets the number of trades.
    #[must_use]
    pub fn with_swaps(mut self, swaps: usize) -> Self {
        self.swaps = swaps;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the probability of selling token0.
    #[must_use]
    pub fn with_zero_for_one_probability(mut self, probability: f64) -> Self {
        self.zero_for_one_probability = probability;
        self
    }

    /// Checks the probability is within `[0, 1]`.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(0.0..=1.0).contains(&self.zero_for_one_probability) {
            return Err(SimulationError::InvalidConfig(format!(
                "zero_for_one_probability {} outside [0, 1]",
                self.zero_for_one_probability
            )));
        }
        Ok(())
    }
}

/// Totals of a swap run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Trades the pool filled.
    pub swaps: usize,
    /// Trades the pool refused.
    pub rejected: usize,
    /// Token0 sold into the pool, fees included.
    pub volume0_in: U256,
    /// Token1 sold into the pool, fees included.
    pub volume1_in: U256,
    /// Fees paid in token0.
    pub fees0: U256,
    /// Fees paid in token1.
    pub fees1: U256,
    /// Tick before the run.
    pub start_tick: i32,
    /// Tick after the run.
    pub end_tick: i32,
}

impl SimulationSummary {
    /// Whether any trade was filled.
    pub fn has_activity(&self) -> bool {
        self.swaps > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder_and_validation() {
        let config = SimulationConfig::default()
            .with_swaps(10)
            .with_seed(1)
            .with_zero_for_one_probability(1.0);
        assert_eq!(config.swaps, 10);
        assert!(config.validate().is_ok());

        assert!(
            SimulationConfig::default()
                .with_zero_for_one_probability(1.5)
                .validate()
                .is_err()
        );
    }
}
