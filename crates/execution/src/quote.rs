//! Forward yield estimates from recorded fee rounds.
//!
//! The engine turns each round's fees into a per-liquidity-unit rate
//! (`fees * 2^128 / liquidity_snapshot`), averages the rates over the lookback
//! window, and scales the average by the liquidity a hypothetical deposit
//! would add and by the number of periods it stays in. Without recorded
//! rounds the estimate is zero and flagged, never extrapolated from nothing.

use crate::config::QuoteConfig;
use crate::error::VaultError;
use crate::ledger::YieldLedger;
use clmm_vault_domain::U256;
use clmm_vault_domain::error::DomainError;
use clmm_vault_domain::math::Q128;
use clmm_vault_domain::math::concentrated_liquidity::get_liquidity_for_amounts;
use clmm_vault_domain::math::full_math::mul_div;
use clmm_vault_domain::math::tick_math::{check_ticks, sqrt_ratio_at_tick};
use clmm_vault_domain::metrics::APY;
use serde::{Deserialize, Serialize};

/// Whether a quote is backed by history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteStatus {
    /// Extrapolated from at least one round with liquidity.
    Estimated,
    /// No usable rounds; the estimate is zero.
    InsufficientHistory,
}

/// Expected fees for a hypothetical deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub fees0: U256,
    pub fees1: U256,
    /// Liquidity the deposit would add over the range.
    pub liquidity: u128,
    pub periods: u64,
    /// Rounds that contributed to the average rate.
    pub rounds_used: usize,
    pub status: QuoteStatus,
}

impl Quote {
    pub(crate) fn insufficient(liquidity: u128, periods: u64) -> Self {
        Self {
            fees0: U256::zero(),
            fees1: U256::zero(),
            liquidity,
            periods,
            rounds_used: 0,
            status: QuoteStatus::InsufficientHistory,
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.status == QuoteStatus::Estimated
    }
}

/// Quote for a single-sided commitment resolved through the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleQuote {
    /// Complementary token1 amount at the current price.
    pub amount1: U256,
    pub quote: Quote,
    /// Expected fees annualized against the deposit value, both in token1.
    pub apy: Option<APY>,
}

impl SingleQuote {
    /// `(amount1, quote0, quote1)`.
    pub fn amounts(&self) -> (U256, U256, U256) {
        (self.amount1, self.quote.fees0, self.quote.fees1)
    }
}

/// Averaged per-liquidity fee rate over a window of rounds, Q128.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRate {
    pub rate0_x128: U256,
    pub rate1_x128: U256,
    pub rounds_used: usize,
}

/// Stateless estimator over a [`YieldLedger`].
#[derive(Debug, Clone, Default)]
pub struct QuoteEngine {
    config: QuoteConfig,
}

impl QuoteEngine {
    pub fn new(config: QuoteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuoteConfig {
        &self.config
    }

    /// Mean fee per liquidity unit per round. Rounds with a zero liquidity
    /// snapshot carry no rate and are skipped.
    pub fn fee_rate(&self, ledger: &YieldLedger) -> Result<Option<FeeRate>, VaultError> {
        let mut sum0 = U256::zero();
        let mut sum1 = U256::zero();
        let mut used = 0usize;

        for record in ledger.window(self.config.lookback_rounds) {
            if record.liquidity_snapshot == 0 {
                continue;
            }
            let snapshot = U256::from(record.liquidity_snapshot);
            sum0 = sum0
                .checked_add(mul_div(record.fees0, Q128, snapshot)?)
                .ok_or(DomainError::Overflow("fee rate"))?;
            sum1 = sum1
                .checked_add(mul_div(record.fees1, Q128, snapshot)?)
                .ok_or(DomainError::Overflow("fee rate"))?;
            used += 1;
        }

        if used == 0 {
            return Ok(None);
        }
        let count = U256::from(used);
        Ok(Some(FeeRate {
            rate0_x128: sum0 / count,
            rate1_x128: sum1 / count,
            rounds_used: used,
        }))
    }

    /// Expected fees for depositing `amount0`/`amount1` into
    /// `[tick_lower, tick_upper)` at `sqrt_price_x96` for `periods` rounds.
    pub fn quote(
        &self,
        ledger: &YieldLedger,
        sqrt_price_x96: U256,
        amount0: U256,
        amount1: U256,
        tick_lower: i32,
        tick_upper: i32,
        periods: u64,
    ) -> Result<Quote, VaultError> {
        check_ticks(tick_lower, tick_upper)?;
        let liquidity = get_liquidity_for_amounts(
            sqrt_price_x96,
            sqrt_ratio_at_tick(tick_lower)?,
            sqrt_ratio_at_tick(tick_upper)?,
            amount0,
            amount1,
        )?;

        let Some(rate) = self.fee_rate(ledger)? else {
            return Ok(Quote::insufficient(liquidity, periods));
        };

        let exposure = U256::from(liquidity) * U256::from(periods);
        Ok(Quote {
            fees0: mul_div(rate.rate0_x128, exposure, Q128)?,
            fees1: mul_div(rate.rate1_x128, exposure, Q128)?,
            liquidity,
            periods,
            rounds_used: rate.rounds_used,
            status: QuoteStatus::Estimated,
        })
    }
}
