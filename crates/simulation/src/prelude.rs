//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use clmm_vault_simulation::prelude::*;
//! ```

// Errors
pub use crate::error::SimulationError;

// Events
pub use crate::event::{EventData, EventLog, SimulationEvent, SimulationEventType};

// State
pub use crate::state::{SimulationConfig, SimulationSummary};

// Swap simulator
pub use crate::swap_simulator::SwapSimulator;

// Volume models
pub use crate::volume::{ConstantVolume, LogNormalVolume, UniformVolume, VolumeModel};
