//! Concentrated liquidity pool interface.

use crate::error::ProtocolError;
use crate::token::TokenClient;
use clmm_vault_domain::fees::FeeTier;
use clmm_vault_domain::token::Address;
use clmm_vault_domain::U256;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Current price state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot0 {
    /// Q64.96 sqrt price.
    pub sqrt_price_x96: U256,
    /// Greatest tick at or below the current price.
    pub tick: i32,
    /// Liquidity active at the current tick.
    pub liquidity: u128,
}

/// Liquidity and uncollected tokens of one pool position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPosition {
    pub liquidity: u128,
    /// Token0 credited by burns and earned fees, not yet collected.
    pub tokens_owed0: U256,
    pub tokens_owed1: U256,
}

/// A concentrated liquidity pool primitive.
///
/// Positions are keyed by `(owner, tick_lower, tick_upper)`. Burning credits
/// principal to the position's owed balances; only `collect` moves tokens out.
pub trait PoolClient: Send + Sync {
    /// Interface version the implementation was built against.
    fn interface_version(&self) -> u32 {
        crate::INTERFACE_VERSION
    }
    /// Pool contract address.
    fn address(&self) -> Address;
    /// Lower-addressed token of the pair.
    fn token0(&self) -> Arc<dyn TokenClient>;
    /// Higher-addressed token of the pair.
    fn token1(&self) -> Arc<dyn TokenClient>;
    /// Fee tier and tick spacing.
    fn fee_tier(&self) -> FeeTier;
    /// Current sqrt price, tick and active liquidity.
    fn slot0(&self) -> Slot0;
    /// Position state, `None` if it was never minted.
    fn position(&self, owner: Address, tick_lower: i32, tick_upper: i32) -> Option<PoolPosition>;

    /// Adds `liquidity` to `recipient`'s position, pulling the owed token
    /// amounts from `caller`. Returns `(amount0, amount1)` paid.
    fn mint(
        &self,
        caller: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    ) -> Result<(U256, U256), ProtocolError>;

    /// Removes `liquidity` from `caller`'s position and credits the released
    /// amounts as owed. Returns `(amount0, amount1)` released.
    fn burn(
        &self,
        caller: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    ) -> Result<(U256, U256), ProtocolError>;

    /// Transfers up to the requested owed amounts of `caller`'s position to
    /// `recipient`. Returns `(amount0, amount1)` transferred.
    fn collect(
        &self,
        caller: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: U256,
        amount1_requested: U256,
    ) -> Result<(U256, U256), ProtocolError>;
}
