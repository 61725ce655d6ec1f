//! Vault engine for concentrated-liquidity yield.
//!
//! This crate provides:
//! - [`PositionManager`](manager::PositionManager): one liquidity range per pool
//! - [`YieldLedger`](ledger::YieldLedger): fee rounds recorded by a manager
//! - [`QuoteEngine`](quote::QuoteEngine): yield estimates from recorded rounds
//! - [`DepositRegistry`](registry::DepositRegistry): pool table and depositor positions
//! - Lifecycle tracking of registry activity

/// Prelude module for convenient imports.
pub mod prelude;

/// Time sources.
pub mod clock;
/// Vault configuration.
pub mod config;
/// Vault errors.
pub mod error;
/// Yield rounds.
pub mod ledger;
/// Registry lifecycle tracking.
pub mod lifecycle;
/// Range management.
pub mod manager;
/// Yield estimates.
pub mod quote;
/// Deposit registry.
pub mod registry;
