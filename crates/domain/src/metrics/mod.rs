pub mod fees;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct APY {
    pub estimated_annual_return: Decimal,
    pub based_on_secs: u64,
}
