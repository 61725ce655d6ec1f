use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Swap fee bucket of a pool, in hundredths of a basis point (500 = 0.05%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeTier {
    pub fee_pips: u32,
    pub tick_spacing: i32,
}

impl FeeTier {
    pub const LOWEST: Self = Self {
        fee_pips: 100,
        tick_spacing: 1,
    };
    pub const LOW: Self = Self {
        fee_pips: 500,
        tick_spacing: 10,
    };
    pub const MEDIUM: Self = Self {
        fee_pips: 3000,
        tick_spacing: 60,
    };
    pub const HIGH: Self = Self {
        fee_pips: 10_000,
        tick_spacing: 200,
    };

    /// Resolves one of the standard tiers from its fee.
    pub fn from_pips(fee_pips: u32) -> Result<Self, DomainError> {
        [Self::LOWEST, Self::LOW, Self::MEDIUM, Self::HIGH]
            .into_iter()
            .find(|tier| tier.fee_pips == fee_pips)
            .ok_or(DomainError::UnsupportedFeeTier(fee_pips))
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fee_pips)
    }
}
