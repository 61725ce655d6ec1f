//! Core domain model for the concentrated liquidity yield vault.
//!
//! This crate holds everything that is pure computation or plain data:
//! - Fixed-point sqrt price and liquidity math (exact 256/512-bit integers)
//! - Entities: pool keys, liquidity ranges, yield records, depositor positions
//! - Fee tiers and yield metrics

/// Prelude module for convenient imports.
pub mod prelude;

/// Entities owned by the vault.
pub mod entities;
/// Enumerations shared across the workspace.
pub mod enums;
/// Domain errors.
pub mod error;
/// Fee tier definitions.
pub mod fees;
/// Concentrated liquidity math.
pub mod math;
/// Yield metrics.
pub mod metrics;
/// Token metadata and addresses.
pub mod token;

pub use primitive_types::{U256, U512};
