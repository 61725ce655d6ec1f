use crate::token::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry key identifying one pool: ordered token pair plus fee tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub token0: Address,
    pub token1: Address,
    pub fee_pips: u32,
}

impl PoolKey {
    pub fn new(token0: Address, token1: Address, fee_pips: u32) -> Self {
        Self {
            token0,
            token1,
            fee_pips,
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}@{}", self.token0, self.token1, self.fee_pips)
    }
}
