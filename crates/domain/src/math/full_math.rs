use crate::error::DomainError;
use primitive_types::{U256, U512};

/// Computes `floor(a * b / denominator)` with a 512-bit intermediate product.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, DomainError> {
    if denominator.is_zero() {
        return Err(DomainError::DivisionByZero);
    }
    let quotient = a.full_mul(b) / U512::from(denominator);
    U256::try_from(quotient).map_err(|_| DomainError::Overflow("mul_div"))
}

/// Computes `ceil(a * b / denominator)` with a 512-bit intermediate product.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, DomainError> {
    if denominator.is_zero() {
        return Err(DomainError::DivisionByZero);
    }
    let (quotient, remainder) = a.full_mul(b).div_mod(U512::from(denominator));
    let quotient = if remainder.is_zero() {
        quotient
    } else {
        quotient + U512::one()
    };
    U256::try_from(quotient).map_err(|_| DomainError::Overflow("mul_div_rounding_up"))
}

/// Computes `ceil(a / b)`.
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, DomainError> {
    if b.is_zero() {
        return Err(DomainError::DivisionByZero);
    }
    let (quotient, remainder) = a.div_mod(b);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::one())
    }
}

/// Narrows a 256-bit value to `u128`, failing instead of truncating.
pub fn to_u128(value: U256, context: &'static str) -> Result<u128, DomainError> {
    if value > U256::from(u128::MAX) {
        return Err(DomainError::Overflow(context));
    }
    Ok(value.low_u128())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_exceeding_256_bits_intermediate() {
        // (2^255 * 4) / 8 = 2^254, the product alone needs 258 bits
        let a = U256::one() << 255;
        let result = mul_div(a, U256::from(4), U256::from(8)).unwrap();
        assert_eq!(result, U256::one() << 254);
    }

    #[test]
    fn test_mul_div_rounding() {
        let down = mul_div(U256::from(7), U256::from(3), U256::from(2)).unwrap();
        let up = mul_div_rounding_up(U256::from(7), U256::from(3), U256::from(2)).unwrap();
        assert_eq!(down, U256::from(10));
        assert_eq!(up, U256::from(11));

        let exact = mul_div_rounding_up(U256::from(8), U256::from(3), U256::from(2)).unwrap();
        assert_eq!(exact, U256::from(12));
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(
            mul_div(U256::one(), U256::one(), U256::zero()),
            Err(DomainError::DivisionByZero)
        );
        assert_eq!(
            mul_div(U256::MAX, U256::MAX, U256::one()),
            Err(DomainError::Overflow("mul_div"))
        );
    }

    #[test]
    fn test_div_rounding_up_and_narrowing() {
        assert_eq!(div_rounding_up(U256::from(9), U256::from(4)).unwrap(), U256::from(3));
        assert_eq!(div_rounding_up(U256::from(8), U256::from(4)).unwrap(), U256::from(2));
        assert_eq!(to_u128(U256::from(u128::MAX), "x").unwrap(), u128::MAX);
        assert!(to_u128(U256::from(u128::MAX) + U256::one(), "x").is_err());
    }
}
