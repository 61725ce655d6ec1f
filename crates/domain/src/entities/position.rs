use crate::entities::PoolKey;
use crate::enums::PositionStatus;
use crate::token::Address;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// A depositor's stake in one pool.
///
/// The first six fields are the public position tuple
/// `(owner, amount0, amount1, duration, start_time, status)`; their order is
/// part of the persisted layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub owner: Address,
    pub amount0: U256,
    pub amount1: U256,
    /// Committed holding period in seconds.
    pub duration: u64,
    pub start_time: u64,
    pub status: PositionStatus,

    pub pool: PoolKey,
    /// Share units issued by the pool's manager for this deposit.
    pub shares: u128,
    /// Manager fee growth per share at deposit time (Q128).
    pub fee_growth0_entry_x128: U256,
    pub fee_growth1_entry_x128: U256,
}

impl Position {
    /// Seconds elapsed since the deposit.
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.start_time)
    }

    /// Whether the committed duration has fully elapsed.
    pub fn commitment_met(&self, now: u64) -> bool {
        self.elapsed(now) >= self.duration
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}
