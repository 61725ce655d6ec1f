use crate::error::DomainError;
use crate::metrics::APY;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Fee denominator: fee tiers are expressed in millionths.
pub const FEE_DENOMINATOR: u32 = 1_000_000;

const SECONDS_PER_YEAR: u64 = 365 * 24 * 3600;

/// Lossless conversion of a raw amount to `Decimal`, `None` past 96 bits.
pub fn to_decimal(value: U256) -> Option<Decimal> {
    Decimal::from_str(&value.to_string()).ok()
}

/// Annualizes a return earned over `duration_secs`.
pub fn calculate_apy(
    fees_earned: Decimal,
    principal: Decimal,
    duration_secs: u64,
) -> Result<APY, DomainError> {
    if principal.is_zero() || duration_secs == 0 {
        return Err(DomainError::DivisionByZero);
    }

    let roi = fees_earned / principal;
    let annualized = roi * (Decimal::from(SECONDS_PER_YEAR) / Decimal::from(duration_secs));

    Ok(APY {
        estimated_annual_return: annualized,
        based_on_secs: duration_secs,
    })
}
