use crate::error::DomainError;
use crate::math::tick_math::check_ticks;
use crate::token::Address;
use serde::{Deserialize, Serialize};

/// The single liquidity range a manager holds against its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRange {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub pool: Address,
}

impl PoolRange {
    /// Creates an empty range after validating the tick ordering and bounds.
    pub fn new(tick_lower: i32, tick_upper: i32, pool: Address) -> Result<Self, DomainError> {
        check_ticks(tick_lower, tick_upper)?;
        Ok(Self {
            tick_lower,
            tick_upper,
            liquidity: 0,
            pool,
        })
    }

    #[must_use]
    pub fn with_liquidity(mut self, liquidity: u128) -> Self {
        self.liquidity = liquidity;
        self
    }

    /// Whether the pool's current tick earns fees for this range.
    pub fn is_in_range(&self, current_tick: i32) -> bool {
        current_tick >= self.tick_lower && current_tick < self.tick_upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_validation() {
        let pool = Address::from_low_u64_be(7);
        assert!(PoolRange::new(-10, 10, pool).is_ok());
        assert_eq!(
            PoolRange::new(10, -10, pool),
            Err(DomainError::InvalidTickRange {
                lower: 10,
                upper: -10
            })
        );
    }

    #[test]
    fn test_in_range_is_half_open() {
        let range = PoolRange::new(-10, 10, Address::zero()).unwrap();
        assert!(range.is_in_range(-10));
        assert!(range.is_in_range(9));
        assert!(!range.is_in_range(10));
    }
}
