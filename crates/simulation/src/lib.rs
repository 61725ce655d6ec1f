//! Swap-flow simulation against the in-process pool.
//!
//! Random trades of configurable size and direction generate the fee
//! activity that vault yield rounds record.

/// Prelude module for convenient imports.
pub mod prelude;

/// Simulation errors.
pub mod error;
/// Simulation event log.
pub mod event;
/// Simulation configuration and results.
pub mod state;
/// Swap driver.
pub mod swap_simulator;
/// Trade size models.
pub mod volume;
