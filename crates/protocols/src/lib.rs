//! Client interfaces for the external primitives the vault drives.
//!
//! The vault never implements pool or token logic itself. It talks to them
//! through the traits in this crate:
//! - [`TokenClient`]: balances, allowances, transfers
//! - [`PoolClient`]: mint, burn, collect and price state of a concentrated
//!   liquidity pool
//! - [`PoolFactory`]: pool lookup by token pair and fee
//!
//! The [`local`] module provides in-process implementations with full tick
//! crossing swap math, used for simulation and tests.

/// Prelude module for convenient imports.
pub mod prelude;

/// Protocol errors.
pub mod error;
/// Pool lookup.
pub mod factory;
/// In-process pool, token and factory.
pub mod local;
/// Pool interface.
pub mod pool;
/// Token interface.
pub mod token;

pub use error::ProtocolError;
pub use factory::PoolFactory;
pub use pool::{PoolClient, PoolPosition, Slot0};
pub use token::TokenClient;

/// Version of the client interfaces. Bumped on any breaking change to the
/// traits so callers can reject mismatched primitives.
pub const INTERFACE_VERSION: u32 = 1;
