//! Random swap flow against a [`LocalPool`].

use crate::error::SimulationError;
use crate::event::{EventLog, SimulationEvent};
use crate::state::{SimulationConfig, SimulationSummary};
use crate::volume::VolumeModel;
use clmm_vault_domain::U256;
use clmm_vault_domain::math::price_tick::token1_for_token0;
use clmm_vault_domain::token::Address;
use clmm_vault_protocols::PoolClient;
use clmm_vault_protocols::local::LocalPool;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info};

/// Drives seeded random trades through a pool on behalf of one trader.
pub struct SwapSimulator<V: VolumeModel> {
    pool: Arc<LocalPool>,
    trader: Address,
    volume: V,
    config: SimulationConfig,
    rng: StdRng,
    log: EventLog,
    step: u64,
}

impl<V: VolumeModel> SwapSimulator<V> {
    /// Creates a simulator; sizes come from `volume` in token0 terms.
    pub fn new(
        pool: Arc<LocalPool>,
        trader: Address,
        volume: V,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            pool,
            trader,
            volume,
            config,
            log: EventLog::new(),
            step: 0,
        })
    }

    pub fn trader(&self) -> Address {
        self.trader
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Mints trading balances to the trader.
    pub fn fund_trader(&self, amount0: U256, amount1: U256) {
        self.pool.local_token0().mint(self.trader, amount0);
        self.pool.local_token1().mint(self.trader, amount1);
    }

    /// Runs the configured number of trades.
    pub fn run(&mut self) -> Result<SimulationSummary, SimulationError> {
        self.run_swaps(self.config.swaps)
    }

    /// Runs `count` trades. Trades the pool refuses are logged and skipped.
    pub fn run_swaps(&mut self, count: usize) -> Result<SimulationSummary, SimulationError> {
        let mut summary = SimulationSummary {
            start_tick: self.pool.slot0().tick,
            ..SimulationSummary::default()
        };

        for _ in 0..count {
            let zero_for_one = self
                .rng
                .random_bool(self.config.zero_for_one_probability);
            let size0 = self.volume.next_volume(&mut self.rng);
            let slot0 = self.pool.slot0();
            let amount_in = if zero_for_one {
                size0
            } else {
                token1_for_token0(size0, slot0.sqrt_price_x96)?
            };

            match self.pool.swap(self.trader, zero_for_one, amount_in) {
                Ok(outcome) => {
                    summary.swaps += 1;
                    if zero_for_one {
                        summary.volume0_in = summary.volume0_in.saturating_add(outcome.amount_in);
                        summary.fees0 = summary.fees0.saturating_add(outcome.fee);
                    } else {
                        summary.volume1_in = summary.volume1_in.saturating_add(outcome.amount_in);
                        summary.fees1 = summary.fees1.saturating_add(outcome.fee);
                    }
                    self.log.record(SimulationEvent::swap(
                        self.step,
                        zero_for_one,
                        amount_in,
                        outcome.tick,
                        outcome.amount_in,
                        outcome.amount_out,
                        outcome.fee,
                    ));
                }
                Err(err) => {
                    summary.rejected += 1;
                    debug!(step = self.step, zero_for_one, amount_in = %amount_in, error = %err, "Swap rejected");
                    self.log.record(SimulationEvent::rejected(
                        self.step,
                        zero_for_one,
                        amount_in,
                        slot0.tick,
                        err.to_string(),
                    ));
                }
            }
            self.step += 1;
        }

        summary.end_tick = self.pool.slot0().tick;
        info!(
            pool = ?self.pool.address(),
            swaps = summary.swaps,
            rejected = summary.rejected,
            fees0 = %summary.fees0,
            fees1 = %summary.fees1,
            start_tick = summary.start_tick,
            end_tick = summary.end_tick,
            "Swap simulation finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SimulationEventType;
    use crate::volume::{ConstantVolume, UniformVolume};
    use clmm_vault_domain::fees::FeeTier;
    use clmm_vault_domain::math::Q96;
    use clmm_vault_domain::token::Token;
    use clmm_vault_protocols::local::LocalToken;

    const LP: u64 = 5;
    const TRADER: u64 = 6;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn units(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    fn pool_with_liquidity() -> Arc<LocalPool> {
        let token0 = Arc::new(LocalToken::new(Token::new(addr(1), "TKA", 18, "Token A")));
        let token1 = Arc::new(LocalToken::new(Token::new(addr(2), "TKB", 18, "Token B")));
        let pool = Arc::new(LocalPool::new(addr(100), token0, token1, FeeTier::LOW, Q96).unwrap());
        pool.local_token0().mint(addr(LP), units(1_000_000));
        pool.local_token1().mint(addr(LP), units(1_000_000));
        pool.mint(addr(LP), addr(LP), -600, 600, 1_000_000_000_000_000_000_000_000)
            .unwrap();
        pool
    }

    fn simulator<V: VolumeModel>(pool: Arc<LocalPool>, volume: V, config: SimulationConfig) -> SwapSimulator<V> {
        let simulator = SwapSimulator::new(pool, addr(TRADER), volume, config).unwrap();
        simulator.fund_trader(units(1_000_000), units(1_000_000));
        simulator
    }

    #[test]
    fn test_run_generates_fees() {
        let volume = UniformVolume::new(1, 10, 18).unwrap();
        let mut sim = simulator(
            pool_with_liquidity(),
            volume,
            SimulationConfig::default().with_swaps(50),
        );

        let summary = sim.run().unwrap();

        assert_eq!(summary.swaps + summary.rejected, 50);
        assert_eq!(summary.swaps, 50);
        assert!(summary.has_activity());
        assert!(summary.fees0 > U256::zero());
        assert!(summary.fees1 > U256::zero());
        assert_eq!(sim.log().count_by_type(SimulationEventType::Swap), 50);
    }

    #[test]
    fn test_one_sided_flow_moves_price_down() {
        let config = SimulationConfig::default()
            .with_swaps(20)
            .with_zero_for_one_probability(1.0);
        let mut sim = simulator(pool_with_liquidity(), ConstantVolume::new(units(100)), config);

        let summary = sim.run().unwrap();

        assert!(summary.volume1_in.is_zero());
        assert!(summary.fees1.is_zero());
        assert_eq!(summary.volume0_in, units(2000));
        assert!(summary.end_tick < summary.start_tick);
    }

    #[test]
    fn test_same_seed_same_run() {
        let config = SimulationConfig::default().with_swaps(30).with_seed(9);
        let a = simulator(
            pool_with_liquidity(),
            UniformVolume::new(1, 1000, 18).unwrap(),
            config.clone(),
        )
        .run()
        .unwrap();
        let b = simulator(
            pool_with_liquidity(),
            UniformVolume::new(1, 1000, 18).unwrap(),
            config,
        )
        .run()
        .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_rejected_swaps_are_logged() {
        let token0 = Arc::new(LocalToken::new(Token::new(addr(1), "TKA", 18, "Token A")));
        let token1 = Arc::new(LocalToken::new(Token::new(addr(2), "TKB", 18, "Token B")));
        let empty = Arc::new(LocalPool::new(addr(100), token0, token1, FeeTier::LOW, Q96).unwrap());
        let mut sim = simulator(empty, ConstantVolume::new(units(1)), SimulationConfig::default().with_swaps(3));

        let summary = sim.run().unwrap();

        assert_eq!(summary.swaps, 0);
        assert_eq!(summary.rejected, 3);
        assert_eq!(sim.log().count_by_type(SimulationEventType::SwapRejected), 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = SwapSimulator::new(
            pool_with_liquidity(),
            addr(TRADER),
            ConstantVolume::new(units(1)),
            SimulationConfig::default().with_zero_for_one_probability(-0.1),
        );
        assert!(result.is_err());
    }
}
