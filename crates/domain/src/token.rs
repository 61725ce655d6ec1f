use primitive_types::H160;
use serde::{Deserialize, Serialize};

/// Account or contract address.
pub type Address = H160;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub name: String,
}

impl Token {
    pub fn new(
        address: Address,
        symbol: impl Into<String>,
        decimals: u8,
        name: impl Into<String>,
    ) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
            name: name.into(),
        }
    }

    /// Scales a whole-unit amount to raw base units (`units * 10^decimals`).
    pub fn units(&self, whole: u64) -> primitive_types::U256 {
        primitive_types::U256::from(whole) * primitive_types::U256::exp10(self.decimals as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    #[test]
    fn test_units_scales_by_decimals() {
        let usdc = Token::new(Address::from_low_u64_be(1), "USDC", 6, "USD Coin");
        assert_eq!(usdc.units(1000), U256::from(1_000_000_000u64));
    }
}
