//! Vault lifecycle tracking.
//!
//! Records every registry action as an event:
//! - Pool registration and first deployment
//! - Deposits and position closes
//! - Fee collection rounds and redeploys

mod events;
mod tracker;

pub use events::*;
pub use tracker::*;
