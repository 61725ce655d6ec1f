//! Errors raised by domain math and validation.

use primitive_types::U256;

/// Errors produced by the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Tick outside the representable range.
    #[error("tick {0} is outside the supported range")]
    TickOutOfBounds(i32),
    /// Sqrt price outside the representable range.
    #[error("sqrt price {0} is outside the supported range")]
    SqrtPriceOutOfBounds(U256),
    /// Lower tick not strictly below upper tick.
    #[error("invalid tick range: lower {lower} must be below upper {upper}")]
    InvalidTickRange {
        /// Lower tick.
        lower: i32,
        /// Upper tick.
        upper: i32,
    },
    /// Price must be strictly positive.
    #[error("price must be positive")]
    NonPositivePrice,
    /// Fee tier has no known tick spacing.
    #[error("unsupported fee tier {0}")]
    UnsupportedFeeTier(u32),
    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Result does not fit the target width.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}
