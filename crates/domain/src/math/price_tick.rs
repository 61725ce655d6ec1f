use crate::error::DomainError;
use crate::math::tick_math::MAX_SQRT_RATIO;
use primitive_types::{U256, U512};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

fn price_x192(sqrt_price_x96: U256) -> Result<U512, DomainError> {
    if sqrt_price_x96.is_zero() || sqrt_price_x96 > MAX_SQRT_RATIO {
        return Err(DomainError::SqrtPriceOutOfBounds(sqrt_price_x96));
    }
    // sqrt price fits in 160 bits, so its square fits in 320.
    Ok(sqrt_price_x96.full_mul(sqrt_price_x96))
}

/// Converts an amount of token0 into token1 at the pool price.
/// amount1 = amount0 * sqrtPriceX96^2 / 2^192, rounded down.
pub fn token1_for_token0(amount0: U256, sqrt_price_x96: U256) -> Result<U256, DomainError> {
    let price = price_x192(sqrt_price_x96)?;
    let product = price
        .checked_mul(U512::from(amount0))
        .ok_or(DomainError::Overflow("token1_for_token0"))?;
    U256::try_from(product >> 192).map_err(|_| DomainError::Overflow("token1_for_token0"))
}

/// Converts an amount of token1 into token0 at the pool price.
/// amount0 = amount1 * 2^192 / sqrtPriceX96^2, rounded down.
pub fn token0_for_token1(amount1: U256, sqrt_price_x96: U256) -> Result<U256, DomainError> {
    let price = price_x192(sqrt_price_x96)?;
    let scaled = U512::from(amount1) << 192;
    U256::try_from(scaled / price).map_err(|_| DomainError::Overflow("token0_for_token1"))
}

/// Returns the tick corresponding to a given price.
/// tick = log_1.0001(P)
pub fn price_to_tick(price: Decimal) -> Result<i32, DomainError> {
    if price <= Decimal::ZERO {
        return Err(DomainError::NonPositivePrice);
    }
    let price_f64 = price.to_f64().ok_or(DomainError::Overflow("price_to_tick"))?;
    let base = 1.0001f64;
    let tick = price_f64.log(base);
    Ok(tick.round() as i32)
}
