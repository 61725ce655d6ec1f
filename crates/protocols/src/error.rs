//! Errors surfaced by pool and token primitives.

use clmm_vault_domain::error::DomainError;
use clmm_vault_domain::token::Address;
use clmm_vault_domain::U256;

/// Failure reported by a pool or token client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Account balance cannot cover a transfer.
    #[error("insufficient balance of {token:?} for {account:?}: required {required}, available {available}")]
    InsufficientBalance {
        /// Token being moved.
        token: Address,
        /// Account being debited.
        account: Address,
        /// Amount requested.
        required: U256,
        /// Amount held.
        available: U256,
    },
    /// Spender allowance cannot cover a delegated transfer.
    #[error("insufficient allowance of {token:?} from {owner:?} to {spender:?}: required {required}, available {available}")]
    InsufficientAllowance {
        /// Token being moved.
        token: Address,
        /// Account whose funds are pulled.
        owner: Address,
        /// Account pulling the funds.
        spender: Address,
        /// Amount requested.
        required: U256,
        /// Amount approved.
        available: U256,
    },
    /// Mint, burn or swap of a zero amount.
    #[error("amount must be greater than zero")]
    ZeroAmount,
    /// No position exists for the owner and ticks.
    #[error("no position for {owner:?} at [{tick_lower}, {tick_upper})")]
    UnknownPosition {
        /// Position owner.
        owner: Address,
        /// Lower tick.
        tick_lower: i32,
        /// Upper tick.
        tick_upper: i32,
    },
    /// Burn larger than the liquidity held.
    #[error("position holds {available} liquidity, cannot burn {requested}")]
    InsufficientPositionLiquidity {
        /// Liquidity held.
        available: u128,
        /// Liquidity requested.
        requested: u128,
    },
    /// Swap against a pool with no liquidity at any tick.
    #[error("pool has no liquidity")]
    NoLiquidity,
    /// A pool already exists for the pair and fee.
    #[error("pool already exists for {token0:?}/{token1:?} at fee {fee_pips}")]
    PoolExists {
        /// Lower-addressed token.
        token0: Address,
        /// Higher-addressed token.
        token1: Address,
        /// Fee in pips.
        fee_pips: u32,
    },
    /// Pool reserves cannot pay a swap output.
    #[error("pool reserves cannot cover output of {0}")]
    InsufficientReserves(U256),
    /// Fixed-point math failure inside the pool.
    #[error(transparent)]
    Math(#[from] DomainError),
}
