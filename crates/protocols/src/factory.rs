use crate::pool::PoolClient;
use clmm_vault_domain::token::Address;
use std::sync::Arc;

/// Resolves deployed pools by token pair and fee.
pub trait PoolFactory: Send + Sync {
    /// Pool for the pair at `fee_pips`, in either token order.
    fn get_pool(&self, token_a: Address, token_b: Address, fee_pips: u32)
    -> Option<Arc<dyn PoolClient>>;
}
