//! Simulation errors.

use clmm_vault_domain::error::DomainError;
use clmm_vault_protocols::ProtocolError;

/// Errors raised while setting up or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Volume model parameters are unusable.
    #[error("invalid volume model: {0}")]
    InvalidVolume(String),
    /// Simulation parameters are unusable.
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
    /// Price conversion failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Pool or token failure outside a swap.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
