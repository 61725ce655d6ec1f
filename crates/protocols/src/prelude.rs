//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use clmm_vault_protocols::prelude::*;
//! ```

pub use crate::error::ProtocolError;
pub use crate::factory::PoolFactory;
pub use crate::local::{LocalFactory, LocalPool, LocalToken, SwapOutcome};
pub use crate::pool::{PoolClient, PoolPosition, Slot0};
pub use crate::token::TokenClient;
pub use crate::INTERFACE_VERSION;
