//! Concentrated liquidity math.
//!
//! All sqrt prices are Q64.96 fixed-point values (`sqrt(price) * 2^96`) held in
//! [`U256`](primitive_types::U256). Intermediate products are widened to
//! [`U512`](primitive_types::U512) so no precision is lost before the final
//! division, and every function documents its rounding direction.

/// Liquidity to token amount conversions.
pub mod concentrated_liquidity;
/// Full-precision multiply/divide helpers.
pub mod full_math;
/// Price helpers built on sqrt prices and ticks.
pub mod price_tick;
/// Tick to sqrt price conversion.
pub mod tick_math;

use primitive_types::U256;

/// 2^96, the scale of a Q64.96 sqrt price.
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);
/// 2^128, the scale of per-unit fee growth accumulators.
pub const Q128: U256 = U256([0, 0, 1, 0]);
