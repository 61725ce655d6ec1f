//! In-process implementations of the client interfaces.
//!
//! `LocalPool` follows the exact fixed-point rules of an on-chain
//! concentrated liquidity pool: mint amounts round up, burn amounts round
//! down, and swaps walk initialized ticks one step at a time, crediting each
//! step's fee pro rata to the positions active during that step.

mod factory;
mod pool;
mod swap_math;
mod token;

pub use factory::LocalFactory;
pub use pool::{LocalPool, SwapOutcome};
pub use token::LocalToken;
