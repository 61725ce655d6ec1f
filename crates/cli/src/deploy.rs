//! In-process deployment used by every subcommand.

use anyhow::{Context, Result, bail};
use clmm_vault_domain::U256;
use clmm_vault_domain::entities::{PoolKey, YieldRecord};
use clmm_vault_domain::fees::FeeTier;
use clmm_vault_domain::math::price_tick::{price_to_tick, token1_for_token0};
use clmm_vault_domain::math::tick_math::sqrt_ratio_at_tick;
use clmm_vault_domain::token::{Address, Token};
use clmm_vault_execution::prelude::*;
use clmm_vault_protocols::local::{LocalFactory, LocalPool, LocalToken};
use clmm_vault_simulation::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Decimals of both demo tokens.
pub const DECIMALS: u8 = 18;

const TOKEN0: u64 = 0xA0;
const TOKEN1: u64 = 0xB0;
const POOL: u64 = 0xC0;

/// Whole units in raw token amounts.
pub fn units(whole: u64) -> U256 {
    U256::from(whole) * U256::exp10(usize::from(DECIMALS))
}

/// Registry, pool and clock wired together in memory.
pub struct LocalDeployment {
    pub registry: DepositRegistry,
    pub cap: AdminCap,
    pub pool: Arc<LocalPool>,
    pub clock: Arc<ManualClock>,
    pub key: PoolKey,
}

impl LocalDeployment {
    /// Creates the pool at `price` (token1 per token0), registers it and
    /// deploys `seed_units` of token0 plus matching token1 around the price.
    pub fn deploy(config: VaultConfig, price: Decimal, fee: FeeTier, seed_units: u64) -> Result<Self> {
        if seed_units == 0 {
            bail!("seed amount must be positive");
        }
        let tick = price_to_tick(price).context("price cannot be mapped to a tick")?;
        let sqrt_price_x96 = sqrt_ratio_at_tick(tick).context("price outside the supported range")?;

        let factory = Arc::new(LocalFactory::new());
        let weth = Arc::new(LocalToken::new(Token::new(
            Address::from_low_u64_be(TOKEN0),
            "WETH",
            DECIMALS,
            "Wrapped Ether",
        )));
        let usdc = Arc::new(LocalToken::new(Token::new(
            Address::from_low_u64_be(TOKEN1),
            "USDC",
            DECIMALS,
            "USD Coin",
        )));
        let pool = factory
            .create_pool(Address::from_low_u64_be(POOL), weth, usdc, fee, sqrt_price_x96)
            .context("failed to create pool")?;

        let clock = Arc::new(ManualClock::new(SystemClock.now()));
        let (mut registry, cap) = DepositRegistry::new(factory, clock.clone(), config);
        let key = PoolKey::new(
            Address::from_low_u64_be(TOKEN0),
            Address::from_low_u64_be(TOKEN1),
            fee.fee_pips,
        );

        let manager = registry
            .add_pool(&cap, key.token0, key.token1, key.fee_pips)
            .context("failed to register pool")?;

        // The manager is funded directly, then deploys around the price.
        let amount0 = units(seed_units);
        let amount1 = token1_for_token0(amount0, sqrt_price_x96)?;
        pool.local_token0().mint(manager, amount0);
        pool.local_token1().mint(manager, amount1);
        let change = registry
            .initialise_pool_at_current_price(&cap, key.token0, key.token1, amount0)
            .context("failed to initialise pool")?;

        info!(
            pool = %key,
            tick,
            tick_lower = change.tick_lower,
            tick_upper = change.tick_upper,
            liquidity = change.liquidity,
            "Local vault deployed"
        );
        Ok(Self {
            registry,
            cap,
            pool,
            clock,
            key,
        })
    }

    /// Runs `rounds` rounds of `swaps_per_round` trades, advancing the clock
    /// by one round interval and collecting fees after each.
    pub fn run_rounds<V: VolumeModel>(
        &mut self,
        simulator: &mut SwapSimulator<V>,
        rounds: usize,
        swaps_per_round: usize,
    ) -> Result<Vec<YieldRecord>> {
        let interval = self.registry.config().quote.round_interval_secs;
        let mut records = Vec::with_capacity(rounds);

        for _ in 0..rounds {
            simulator
                .run_swaps(swaps_per_round)
                .context("swap simulation failed")?;
            self.clock.advance(interval);
            let record = self
                .registry
                .collect_fees(&self.cap, &self.key)
                .context("fee collection failed")?;
            records.push(record);
        }
        Ok(records)
    }
}
