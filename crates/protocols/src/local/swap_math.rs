use crate::error::ProtocolError;
use clmm_vault_domain::U256;
use clmm_vault_domain::error::DomainError;
use clmm_vault_domain::math::Q96;
use clmm_vault_domain::math::concentrated_liquidity::{get_amount0_delta, get_amount1_delta};
use clmm_vault_domain::math::full_math::{div_rounding_up, mul_div, mul_div_rounding_up};
use clmm_vault_domain::metrics::fees::FEE_DENOMINATOR;

/// Result of one swap step between the current price and a target price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SwapStep {
    pub sqrt_price_next: U256,
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee_amount: U256,
}

/// Price after adding `amount` of token0, rounded up so the price never
/// drops further than the input pays for.
fn next_sqrt_price_from_amount0(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
) -> Result<U256, DomainError> {
    if amount.is_zero() {
        return Ok(sqrt_price);
    }
    let numerator1 = U256::from(liquidity) << 96;

    if let Some(product) = amount.checked_mul(sqrt_price) {
        if let Some(denominator) = numerator1.checked_add(product) {
            return mul_div_rounding_up(numerator1, sqrt_price, denominator);
        }
    }

    let denominator = (numerator1 / sqrt_price)
        .checked_add(amount)
        .ok_or(DomainError::Overflow("next sqrt price from amount0"))?;
    div_rounding_up(numerator1, denominator)
}

/// Price after adding `amount` of token1, rounded down.
fn next_sqrt_price_from_amount1(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
) -> Result<U256, DomainError> {
    let quotient = mul_div(amount, Q96, U256::from(liquidity))?;
    sqrt_price
        .checked_add(quotient)
        .ok_or(DomainError::Overflow("next sqrt price from amount1"))
}

/// Computes one exact-input swap step.
///
/// Moves from `sqrt_price_current` toward `sqrt_price_target` with constant
/// `liquidity`, stopping early once `amount_remaining` (fee included) is spent.
pub(crate) fn compute_swap_step(
    sqrt_price_current: U256,
    sqrt_price_target: U256,
    liquidity: u128,
    amount_remaining: U256,
    fee_pips: u32,
) -> Result<SwapStep, ProtocolError> {
    let zero_for_one = sqrt_price_current >= sqrt_price_target;
    let denominator = U256::from(FEE_DENOMINATOR);
    let fee_complement = U256::from(FEE_DENOMINATOR - fee_pips);

    let amount_remaining_less_fee = mul_div(amount_remaining, fee_complement, denominator)?;
    let amount_in_to_target = if zero_for_one {
        get_amount0_delta(liquidity, sqrt_price_target, sqrt_price_current, true)?
    } else {
        get_amount1_delta(liquidity, sqrt_price_current, sqrt_price_target, true)?
    };

    let sqrt_price_next = if amount_remaining_less_fee >= amount_in_to_target {
        sqrt_price_target
    } else if zero_for_one {
        next_sqrt_price_from_amount0(sqrt_price_current, liquidity, amount_remaining_less_fee)?
    } else {
        next_sqrt_price_from_amount1(sqrt_price_current, liquidity, amount_remaining_less_fee)?
    };
    let reached_target = sqrt_price_next == sqrt_price_target;

    let (amount_in, amount_out) = if zero_for_one {
        let amount_in = if reached_target {
            amount_in_to_target
        } else {
            get_amount0_delta(liquidity, sqrt_price_next, sqrt_price_current, true)?
        };
        let out = get_amount1_delta(liquidity, sqrt_price_next, sqrt_price_current, false)?;
        (amount_in, out)
    } else {
        let amount_in = if reached_target {
            amount_in_to_target
        } else {
            get_amount1_delta(liquidity, sqrt_price_current, sqrt_price_next, true)?
        };
        let out = get_amount0_delta(liquidity, sqrt_price_current, sqrt_price_next, false)?;
        (amount_in, out)
    };

    // Whatever input is left after a partial step is all fee.
    let fee_amount = if reached_target {
        mul_div_rounding_up(amount_in, U256::from(fee_pips), fee_complement)?
    } else {
        amount_remaining.saturating_sub(amount_in)
    };

    Ok(SwapStep {
        sqrt_price_next,
        amount_in,
        amount_out,
        fee_amount,
    })
}
