//! Errors raised by vault operations.

use clmm_vault_domain::entities::PoolKey;
use clmm_vault_domain::error::DomainError;
use clmm_vault_domain::token::Address;
use clmm_vault_protocols::ProtocolError;

/// Failure of a vault operation. Every variant aborts the whole call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    /// Capability does not belong to this registry.
    #[error("caller is not authorized for this registry")]
    Unauthorized,
    /// Pair and fee tier already registered.
    #[error("pool already registered: {0}")]
    PoolExists(PoolKey),
    /// Pair and fee tier not registered.
    #[error("no pool registered for {0}")]
    PoolNotRegistered(PoolKey),
    /// No registered pool for the token pair at any fee tier.
    #[error("no pool registered for pair {token0:?}/{token1:?}")]
    PairNotRegistered {
        /// First token.
        token0: Address,
        /// Second token.
        token1: Address,
    },
    /// Factory has no deployed pool for the pair and fee.
    #[error("factory has no pool for {0}")]
    PoolNotFound(PoolKey),
    /// Pool orders the pair differently from the request.
    #[error("pool for {requested} holds tokens {actual0:?}/{actual1:?}")]
    TokenOrderMismatch {
        /// Requested key.
        requested: PoolKey,
        /// Pool's token0.
        actual0: Address,
        /// Pool's token1.
        actual1: Address,
    },
    /// Pool implements a different client interface version.
    #[error("pool interface version {found} is not supported, expected {expected}")]
    InterfaceVersion {
        /// Supported version.
        expected: u32,
        /// Reported version.
        found: u32,
    },
    /// Deposit or liquidity amounts are zero.
    #[error("amounts must be greater than zero")]
    ZeroAmount,
    /// Amounts back no liquidity over the range.
    #[error("amounts produce zero liquidity")]
    ZeroLiquidity,
    /// Manager already holds a range.
    #[error("manager already holds range [{tick_lower}, {tick_upper})")]
    RangeActive {
        /// Lower tick of the held range.
        tick_lower: i32,
        /// Upper tick of the held range.
        tick_upper: i32,
    },
    /// Manager holds no range yet.
    #[error("manager has no active range")]
    NoActiveRange,
    /// Pool already carries liquidity.
    #[error("pool already initialised with liquidity {0}")]
    AlreadyInitialised(u128),
    /// Owner already holds an open position.
    #[error("{0:?} already holds an open position")]
    PositionExists(Address),
    /// Owner holds no position.
    #[error("no position for {0:?}")]
    NoPosition(Address),
    /// Position was closed earlier.
    #[error("position of {0:?} is already closed")]
    PositionClosed(Address),
    /// Shares requested exceed shares issued.
    #[error("cannot redeem {requested} shares, {available} outstanding")]
    InsufficientShares {
        /// Outstanding shares.
        available: u128,
        /// Requested shares.
        requested: u128,
    },
    /// Math or validation failure.
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Pool or token failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
