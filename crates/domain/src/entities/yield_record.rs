use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// One fee-collection round.
///
/// `YieldRecord::default()` is the all-zero record returned for rounds that
/// have not happened yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldRecord {
    pub round_index: u64,
    pub fees0: U256,
    pub fees1: U256,
    pub liquidity_snapshot: u128,
    pub timestamp: u64,
}

impl YieldRecord {
    pub fn has_fees(&self) -> bool {
        !self.fees0.is_zero() || !self.fees1.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}
