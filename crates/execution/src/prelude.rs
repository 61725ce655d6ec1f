//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use clmm_vault_execution::prelude::*;
//! ```

// Clock
pub use crate::clock::{Clock, ManualClock, SystemClock};

// Config
pub use crate::config::{ConfigError, ManagerConfig, QuoteConfig, VaultConfig};

// Errors
pub use crate::error::VaultError;

// Ledger
pub use crate::ledger::YieldLedger;

// Lifecycle
pub use crate::lifecycle::{
    AggregateStats, DepositData, EventData, FeesCollectedData, LifecycleEvent,
    LifecycleEventType, LifecycleTracker, LiquidityData, PoolAddedData, PoolSummary,
    PositionClosedData, RedeployData,
};

// Manager
pub use crate::manager::{LiquidityChange, PositionManager, Redeployment, Withdrawal, range_around};

// Quotes
pub use crate::quote::{FeeRate, Quote, QuoteEngine, QuoteStatus, SingleQuote};

// Registry
pub use crate::registry::{AdminCap, ClosedPosition, DepositRegistry};
