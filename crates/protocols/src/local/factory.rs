use crate::error::ProtocolError;
use crate::factory::PoolFactory;
use crate::local::pool::LocalPool;
use crate::local::token::LocalToken;
use crate::pool::PoolClient;
use crate::token::TokenClient;
use clmm_vault_domain::U256;
use clmm_vault_domain::fees::FeeTier;
use clmm_vault_domain::token::Address;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

type PairKey = (Address, Address, u32);

fn sorted(token_a: Address, token_b: Address) -> (Address, Address) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

/// Registry of in-process pools.
#[derive(Debug, Default)]
pub struct LocalFactory {
    pools: RwLock<HashMap<PairKey, Arc<LocalPool>>>,
}

impl LocalFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploys a pool for the pair. Tokens are ordered by address, and
    /// `sqrt_price_x96` is the price of the higher token in the lower one.
    pub fn create_pool(
        &self,
        address: Address,
        token_a: Arc<LocalToken>,
        token_b: Arc<LocalToken>,
        fee_tier: FeeTier,
        sqrt_price_x96: U256,
    ) -> Result<Arc<LocalPool>, ProtocolError> {
        let (token0, token1) = if token_a.address() < token_b.address() {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        let key = (token0.address(), token1.address(), fee_tier.fee_pips);

        let mut pools = self.pools.write().unwrap_or_else(|e| e.into_inner());
        if pools.contains_key(&key) {
            return Err(ProtocolError::PoolExists {
                token0: key.0,
                token1: key.1,
                fee_pips: key.2,
            });
        }

        let pool = Arc::new(LocalPool::new(address, token0, token1, fee_tier, sqrt_price_x96)?);
        pools.insert(key, pool.clone());
        info!(
            pool = ?address,
            token0 = ?key.0,
            token1 = ?key.1,
            fee = fee_tier.fee_pips,
            "Pool created"
        );
        Ok(pool)
    }

    /// Concrete pool handle, for callers that also drive swaps.
    pub fn local_pool(&self, token_a: Address, token_b: Address, fee_pips: u32) -> Option<Arc<LocalPool>> {
        let (token0, token1) = sorted(token_a, token_b);
        let pools = self.pools.read().unwrap_or_else(|e| e.into_inner());
        pools.get(&(token0, token1, fee_pips)).cloned()
    }
}

impl PoolFactory for LocalFactory {
    fn get_pool(
        &self,
        token_a: Address,
        token_b: Address,
        fee_pips: u32,
    ) -> Option<Arc<dyn PoolClient>> {
        self.local_pool(token_a, token_b, fee_pips)
            .map(|pool| pool as Arc<dyn PoolClient>)
    }
}
