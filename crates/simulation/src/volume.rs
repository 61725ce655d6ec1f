use crate::error::SimulationError;
use clmm_vault_domain::U256;
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, LogNormal};

const MICRO: u64 = 1_000_000;

/// Trait for modeling trade sizes.
pub trait VolumeModel {
    /// Returns the raw token0 amount of the next trade.
    fn next_volume(&mut self, rng: &mut StdRng) -> U256;
}

/// Every trade has the same size.
#[derive(Debug, Clone)]
pub struct ConstantVolume {
    /// Raw amount per trade.
    pub amount: U256,
}

impl ConstantVolume {
    /// Creates a constant volume model.
    #[must_use]
    pub fn new(amount: U256) -> Self {
        Self { amount }
    }
}

impl VolumeModel for ConstantVolume {
    fn next_volume(&mut self, _rng: &mut StdRng) -> U256 {
        self.amount
    }
}

/// Whole-unit trade sizes drawn uniformly from `[min_units, max_units]`.
#[derive(Debug, Clone)]
pub struct UniformVolume {
    min_units: u64,
    max_units: u64,
    unit: U256,
}

impl UniformVolume {
    /// Creates a uniform model for a token with `decimals` decimals.
    ///
    /// # Errors
    /// Fails if `min_units` is zero or above `max_units`.
    pub fn new(min_units: u64, max_units: u64, decimals: u8) -> Result<Self, SimulationError> {
        if min_units == 0 || min_units > max_units {
            return Err(SimulationError::InvalidVolume(format!(
                "uniform bounds [{min_units}, {max_units}]"
            )));
        }
        Ok(Self {
            min_units,
            max_units,
            unit: U256::exp10(usize::from(decimals)),
        })
    }
}

impl VolumeModel for UniformVolume {
    fn next_volume(&mut self, rng: &mut StdRng) -> U256 {
        let units = rng.random_range(self.min_units..=self.max_units);
        U256::from(units) * self.unit
    }
}

/// Log-normal trade sizes: many small trades, a few large ones.
#[derive(Debug, Clone)]
pub struct LogNormalVolume {
    distribution: LogNormal<f64>,
    max_units: f64,
    unit: U256,
}

impl LogNormalVolume {
    /// Creates a model whose size in whole units is `exp(N(mu, sigma))`,
    /// capped at `max_units`.
    ///
    /// # Errors
    /// Fails for a negative or non-finite `sigma` or a zero cap.
    pub fn new(mu: f64, sigma: f64, max_units: u64, decimals: u8) -> Result<Self, SimulationError> {
        if max_units == 0 {
            return Err(SimulationError::InvalidVolume("zero size cap".to_string()));
        }
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(SimulationError::InvalidVolume(format!("log-normal sigma {sigma}")));
        }
        let distribution = LogNormal::new(mu, sigma)
            .map_err(|e| SimulationError::InvalidVolume(format!("log-normal({mu}, {sigma}): {e}")))?;
        Ok(Self {
            distribution,
            max_units: max_units as f64,
            unit: U256::exp10(usize::from(decimals)),
        })
    }
}

impl VolumeModel for LogNormalVolume {
    fn next_volume(&mut self, rng: &mut StdRng) -> U256 {
        let units = self.distribution.sample(rng).min(self.max_units);
        // Sizes are kept to a millionth of a unit.
        let micro = (units * MICRO as f64).round() as u128;
        U256::from(micro) * self.unit / U256::from(MICRO)
    }
}
