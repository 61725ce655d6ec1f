//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use clmm_vault_domain::prelude::*;
//! ```

pub use crate::entities::{PoolKey, PoolRange, Position, YieldRecord};
pub use crate::enums::PositionStatus;
pub use crate::error::DomainError;
pub use crate::fees::FeeTier;
pub use crate::math::concentrated_liquidity::{
    get_amount0_delta, get_amount1_delta, get_amounts_for_liquidity, get_liquidity_for_amounts,
};
pub use crate::math::price_tick::{token0_for_token1, token1_for_token0};
pub use crate::math::tick_math::{
    MAX_TICK, MIN_TICK, floor_to_spacing, sqrt_ratio_at_tick, tick_at_sqrt_ratio,
};
pub use crate::math::{Q96, Q128};
pub use crate::token::{Address, Token};
pub use primitive_types::U256;
