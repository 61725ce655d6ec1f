use crate::error::DomainError;
use crate::math::Q96;
use crate::math::full_math::{div_rounding_up, mul_div, mul_div_rounding_up, to_u128};
use primitive_types::U256;

fn ordered(sqrt_price_a: U256, sqrt_price_b: U256) -> (U256, U256) {
    if sqrt_price_a < sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    }
}

/// Calculates the amount of token0 spanned by `liquidity` between two sqrt prices.
/// delta_x = L * 2^96 * (sqrt(P_b) - sqrt(P_a)) / (sqrt(P_b) * sqrt(P_a))
///
/// `round_up` is used for amounts owed to a pool (mint), `false` for amounts
/// paid out of it (burn).
pub fn get_amount0_delta(
    liquidity: u128,
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    round_up: bool,
) -> Result<U256, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);
    if lower.is_zero() {
        return Err(DomainError::DivisionByZero);
    }

    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = upper - lower;

    if round_up {
        div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper)?, lower)
    } else {
        Ok(mul_div(numerator1, numerator2, upper)? / lower)
    }
}

/// Calculates the amount of token1 spanned by `liquidity` between two sqrt prices.
/// delta_y = L * (sqrt(P_b) - sqrt(P_a)) / 2^96
pub fn get_amount1_delta(
    liquidity: u128,
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    round_up: bool,
) -> Result<U256, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);
    let liquidity = U256::from(liquidity);

    if round_up {
        mul_div_rounding_up(liquidity, upper - lower, Q96)
    } else {
        mul_div(liquidity, upper - lower, Q96)
    }
}

/// Calculates liquidity for a given amount of token0 and price range.
/// L = amount0 * (sqrt(P_a) * sqrt(P_b) / 2^96) / (sqrt(P_b) - sqrt(P_a)), rounded down.
pub fn get_liquidity_for_amount0(
    amount0: U256,
    sqrt_price_a: U256,
    sqrt_price_b: U256,
) -> Result<u128, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);
    let intermediate = mul_div(lower, upper, Q96)?;
    let liquidity = mul_div(amount0, intermediate, upper - lower)?;
    to_u128(liquidity, "liquidity for amount0")
}

/// Calculates liquidity for a given amount of token1 and price range.
/// L = amount1 * 2^96 / (sqrt(P_b) - sqrt(P_a)), rounded down.
pub fn get_liquidity_for_amount1(
    amount1: U256,
    sqrt_price_a: U256,
    sqrt_price_b: U256,
) -> Result<u128, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);
    let liquidity = mul_div(amount1, Q96, upper - lower)?;
    to_u128(liquidity, "liquidity for amount1")
}

/// Maximum liquidity that `amount0` and `amount1` can back over
/// `[sqrt_price_a, sqrt_price_b]` at the current `sqrt_price`.
///
/// Below the range only token0 counts, above it only token1, inside it the
/// scarcer side bounds the result.
pub fn get_liquidity_for_amounts(
    sqrt_price: U256,
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    amount0: U256,
    amount1: U256,
) -> Result<u128, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);

    if sqrt_price <= lower {
        get_liquidity_for_amount0(amount0, lower, upper)
    } else if sqrt_price < upper {
        let liquidity0 = get_liquidity_for_amount0(amount0, sqrt_price, upper)?;
        let liquidity1 = get_liquidity_for_amount1(amount1, lower, sqrt_price)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        get_liquidity_for_amount1(amount1, lower, upper)
    }
}

/// Token amounts represented by `liquidity` over `[sqrt_price_a, sqrt_price_b]`
/// at the current `sqrt_price`.
pub fn get_amounts_for_liquidity(
    sqrt_price: U256,
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<(U256, U256), DomainError> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);

    if sqrt_price <= lower {
        let amount0 = get_amount0_delta(liquidity, lower, upper, round_up)?;
        Ok((amount0, U256::zero()))
    } else if sqrt_price < upper {
        let amount0 = get_amount0_delta(liquidity, sqrt_price, upper, round_up)?;
        let amount1 = get_amount1_delta(liquidity, lower, sqrt_price, round_up)?;
        Ok((amount0, amount1))
    } else {
        let amount1 = get_amount1_delta(liquidity, lower, upper, round_up)?;
        Ok((U256::zero(), amount1))
    }
}
