//! Management of a single liquidity range against one pool.
//!
//! A [`PositionManager`] owns at most one [`PoolRange`] and the
//! [`YieldLedger`] of fees that range earned. Capital added to the range is
//! accounted in shares so that fees can be apportioned between depositors:
//! every fee collection raises a per-share growth accumulator (Q128), and a
//! redemption pays its shares' slice of the range plus the growth accrued
//! since the shares were issued.
//!
//! Amounts, balances and position liquidity are checked before the pool is
//! touched, and fees are only settled once those checks pass. Bookkeeping is
//! then updated ahead of the pool calls and restored if one fails. A redeploy
//! whose new mint is refused mints the old range back instead.

use crate::clock::Clock;
use crate::config::{ManagerConfig, QuoteConfig};
use crate::error::VaultError;
use crate::ledger::YieldLedger;
use crate::quote::{Quote, QuoteEngine};
use clmm_vault_domain::U256;
use clmm_vault_domain::entities::{PoolRange, YieldRecord};
use clmm_vault_domain::error::DomainError;
use clmm_vault_domain::math::Q128;
use clmm_vault_domain::math::concentrated_liquidity::{
    get_amounts_for_liquidity, get_liquidity_for_amounts,
};
use clmm_vault_domain::math::full_math::{mul_div, to_u128};
use clmm_vault_domain::math::price_tick::token1_for_token0;
use clmm_vault_domain::math::tick_math::{
    MAX_TICK, check_ticks, floor_to_spacing, sqrt_ratio_at_tick,
};
use clmm_vault_domain::token::Address;
use clmm_vault_protocols::{PoolClient, ProtocolError, TokenClient};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Liquidity minted by an add or increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityChange {
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Liquidity minted by this call.
    pub liquidity: u128,
    /// Shares issued for it.
    pub shares: u128,
    /// Token0 paid into the pool.
    pub amount0: U256,
    /// Token1 paid into the pool.
    pub amount1: U256,
}

/// Outcome of moving the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redeployment {
    pub old_tick_lower: i32,
    pub old_tick_upper: i32,
    pub new_tick_lower: i32,
    pub new_tick_upper: i32,
    pub old_liquidity: u128,
    pub new_liquidity: u128,
    /// Token0 withdrawn from the old range, compounded fees included.
    pub withdrawn0: U256,
    pub withdrawn1: U256,
    /// Token0 re-minted into the new range.
    pub deployed0: U256,
    pub deployed1: U256,
    /// Fees settled to shareholders before the move, or compounded into
    /// the new range.
    pub fees0: U256,
    pub fees1: U256,
}

/// Tokens paid out for redeemed shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub shares: u128,
    /// Liquidity burned for the shares.
    pub liquidity: u128,
    /// Principal token0 returned.
    pub amount0: U256,
    pub amount1: U256,
    /// Fee token0 accrued by the shares.
    pub fees0: U256,
    pub fees1: U256,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ManagerState {
    range: Option<PoolRange>,
    ledger: YieldLedger,
    total_shares: u128,
    fee_growth0_x128: U256,
    fee_growth1_x128: U256,
    /// Fees collected since the last recorded round.
    pending_fees0: U256,
    pending_fees1: U256,
}

/// Derives the manager's account address from its id.
pub fn address_from_id(id: &Uuid) -> Address {
    let mut bytes = [0u8; 20];
    bytes[4..].copy_from_slice(id.as_bytes());
    Address::from(bytes)
}

/// Range around `tick`, `width` ticks wide, aligned to `spacing`.
pub fn range_around(tick: i32, spacing: i32, width: i32) -> (i32, i32) {
    let spacing = spacing.max(1);
    let base = floor_to_spacing(tick, spacing);
    let half = floor_to_spacing(width / 2, spacing).max(spacing);
    let max = floor_to_spacing(MAX_TICK, spacing);

    ((base - half).max(-max), (base + half).min(max))
}

fn liquidity_for(
    sqrt_price_x96: U256,
    tick_lower: i32,
    tick_upper: i32,
    amount0: U256,
    amount1: U256,
) -> Result<u128, DomainError> {
    get_liquidity_for_amounts(
        sqrt_price_x96,
        sqrt_ratio_at_tick(tick_lower)?,
        sqrt_ratio_at_tick(tick_upper)?,
        amount0,
        amount1,
    )
}

/// Owns one liquidity range against one pool, and the yield it earns.
pub struct PositionManager {
    id: Uuid,
    address: Address,
    pool: Arc<dyn PoolClient>,
    token0: Arc<dyn TokenClient>,
    token1: Arc<dyn TokenClient>,
    config: ManagerConfig,
    quotes: QuoteEngine,
    clock: Arc<dyn Clock>,
    state: ManagerState,
}

impl fmt::Debug for PositionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionManager")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("pool", &self.pool.address())
            .field("range", &self.state.range)
            .field("total_shares", &self.state.total_shares)
            .field("rounds", &self.state.ledger.rounds())
            .finish()
    }
}

impl PositionManager {
    /// Creates a manager bound to `pool`, with no range yet.
    pub fn new(
        pool: Arc<dyn PoolClient>,
        config: ManagerConfig,
        quote_config: QuoteConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            address: address_from_id(&id),
            token0: pool.token0(),
            token1: pool.token1(),
            pool,
            config,
            quotes: QuoteEngine::new(quote_config),
            clock,
            state: ManagerState::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Account holding the manager's tokens and pool position.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn pool(&self) -> &Arc<dyn PoolClient> {
        &self.pool
    }

    pub fn pool_address(&self) -> Address {
        self.pool.address()
    }

    pub fn token0(&self) -> &Arc<dyn TokenClient> {
        &self.token0
    }

    pub fn token1(&self) -> &Arc<dyn TokenClient> {
        &self.token1
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn range(&self) -> Option<&PoolRange> {
        self.state.range.as_ref()
    }

    /// Liquidity in the active range, zero without one.
    pub fn current_liquidity(&self) -> u128 {
        self.state.range.map(|r| r.liquidity).unwrap_or_default()
    }

    pub fn tick_lower(&self) -> Option<i32> {
        self.state.range.map(|r| r.tick_lower)
    }

    pub fn tick_upper(&self) -> Option<i32> {
        self.state.range.map(|r| r.tick_upper)
    }

    pub fn ledger(&self) -> &YieldLedger {
        &self.state.ledger
    }

    /// Record of round `round`, all zero past the last round.
    pub fn yield_history(&self, round: u64) -> YieldRecord {
        self.state.ledger.yield_history(round)
    }

    pub fn total_shares(&self) -> u128 {
        self.state.total_shares
    }

    /// Fee growth per share, Q128.
    pub fn fee_growth_x128(&self) -> (U256, U256) {
        (self.state.fee_growth0_x128, self.state.fee_growth1_x128)
    }

    /// Runs `op`, restoring the bookkeeping if it fails.
    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let snapshot = self.state.clone();
        let result = op(self);
        if result.is_err() {
            self.state = snapshot;
        }
        result
    }

    fn shares_for(&self, liquidity: u128) -> Result<u128, VaultError> {
        let current = self.current_liquidity();
        if self.state.total_shares == 0 || current == 0 {
            return Ok(liquidity);
        }
        let shares = mul_div(
            U256::from(liquidity),
            U256::from(self.state.total_shares),
            U256::from(current),
        )?;
        Ok(to_u128(shares, "shares")?)
    }

    fn ensure_balance(&self, token: &Arc<dyn TokenClient>, amount: U256) -> Result<(), VaultError> {
        let available = token.balance_of(self.address);
        if available < amount {
            return Err(ProtocolError::InsufficientBalance {
                token: token.address(),
                account: self.address,
                required: amount,
                available,
            }
            .into());
        }
        Ok(())
    }

    fn accrue(&mut self, fees0: U256, fees1: U256) -> Result<(), VaultError> {
        if self.state.total_shares > 0 {
            let shares = U256::from(self.state.total_shares);
            self.state.fee_growth0_x128 = self
                .state
                .fee_growth0_x128
                .overflowing_add(mul_div(fees0, Q128, shares)?)
                .0;
            self.state.fee_growth1_x128 = self
                .state
                .fee_growth1_x128
                .overflowing_add(mul_div(fees1, Q128, shares)?)
                .0;
        }
        self.state.pending_fees0 = self.state.pending_fees0.saturating_add(fees0);
        self.state.pending_fees1 = self.state.pending_fees1.saturating_add(fees1);
        Ok(())
    }

    /// Pulls the fees the range has earned into the manager and credits them
    /// to shareholders, without closing a round.
    fn settle_fees(&mut self) -> Result<(U256, U256), VaultError> {
        let Some(range) = self.state.range else {
            return Ok((U256::zero(), U256::zero()));
        };
        // A zero burn makes the pool account fees up to now.
        self.pool
            .burn(self.address, range.tick_lower, range.tick_upper, 0)?;
        let (fees0, fees1) = self.pool.collect(
            self.address,
            self.address,
            range.tick_lower,
            range.tick_upper,
            U256::MAX,
            U256::MAX,
        )?;
        self.accrue(fees0, fees1)?;

        debug!(
            manager = ?self.address,
            fees0 = %fees0,
            fees1 = %fees1,
            "Fees settled"
        );
        Ok((fees0, fees1))
    }

    /// Mints a new range from `amount0`/`amount1` held by the manager.
    ///
    /// # Errors
    /// Fails if a range is already held, the ticks are invalid, both amounts
    /// are zero or they back no liquidity at the current price.
    pub fn add_liquidity(
        &mut self,
        amount0: U256,
        amount1: U256,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<LiquidityChange, VaultError> {
        if let Some(range) = self.state.range {
            return Err(VaultError::RangeActive {
                tick_lower: range.tick_lower,
                tick_upper: range.tick_upper,
            });
        }
        let range = PoolRange::new(tick_lower, tick_upper, self.pool.address())?;
        if amount0.is_zero() && amount1.is_zero() {
            return Err(VaultError::ZeroAmount);
        }

        let slot0 = self.pool.slot0();
        let liquidity = liquidity_for(slot0.sqrt_price_x96, tick_lower, tick_upper, amount0, amount1)?;
        if liquidity == 0 {
            return Err(VaultError::ZeroLiquidity);
        }

        let change = self.transact(|manager| {
            manager.state.range = Some(range.with_liquidity(liquidity));
            manager.state.total_shares = manager
                .state
                .total_shares
                .checked_add(liquidity)
                .ok_or(DomainError::Overflow("total shares"))?;

            let (paid0, paid1) = manager.pool.mint(
                manager.address,
                manager.address,
                tick_lower,
                tick_upper,
                liquidity,
            )?;
            Ok(LiquidityChange {
                tick_lower,
                tick_upper,
                liquidity,
                shares: liquidity,
                amount0: paid0,
                amount1: paid1,
            })
        })?;

        info!(
            manager = ?self.address,
            tick_lower,
            tick_upper,
            liquidity,
            amount0 = %change.amount0,
            amount1 = %change.amount1,
            "Range opened"
        );
        Ok(change)
    }

    /// Adds capital to the existing range and issues shares for it.
    pub fn increase_liquidity(
        &mut self,
        amount0: U256,
        amount1: U256,
    ) -> Result<LiquidityChange, VaultError> {
        let range = self.state.range.ok_or(VaultError::NoActiveRange)?;
        if amount0.is_zero() && amount1.is_zero() {
            return Err(VaultError::ZeroAmount);
        }

        let slot0 = self.pool.slot0();
        let liquidity = liquidity_for(
            slot0.sqrt_price_x96,
            range.tick_lower,
            range.tick_upper,
            amount0,
            amount1,
        )?;
        if liquidity == 0 {
            return Err(VaultError::ZeroLiquidity);
        }
        let shares = self.shares_for(liquidity)?;
        range
            .liquidity
            .checked_add(liquidity)
            .ok_or(DomainError::Overflow("range liquidity"))?;
        self.state
            .total_shares
            .checked_add(shares)
            .ok_or(DomainError::Overflow("total shares"))?;

        // New shares must not earn fees accrued before they existed.
        self.settle_fees()?;

        let change = self.transact(|manager| {
            let total = range
                .liquidity
                .checked_add(liquidity)
                .ok_or(DomainError::Overflow("range liquidity"))?;
            manager.state.range = Some(range.with_liquidity(total));
            manager.state.total_shares = manager
                .state
                .total_shares
                .checked_add(shares)
                .ok_or(DomainError::Overflow("total shares"))?;

            let (paid0, paid1) = manager.pool.mint(
                manager.address,
                manager.address,
                range.tick_lower,
                range.tick_upper,
                liquidity,
            )?;
            Ok(LiquidityChange {
                tick_lower: range.tick_lower,
                tick_upper: range.tick_upper,
                liquidity,
                shares,
                amount0: paid0,
                amount1: paid1,
            })
        })?;

        info!(
            manager = ?self.address,
            liquidity,
            shares,
            total_liquidity = self.current_liquidity(),
            "Liquidity increased"
        );
        Ok(change)
    }

    /// Opens a range of the configured width around the current tick, pairing
    /// `amount0` with the token1 amount of equal value at the current price.
    pub fn add_liquidity_around_current_price(
        &mut self,
        amount0: U256,
    ) -> Result<LiquidityChange, VaultError> {
        if amount0.is_zero() {
            return Err(VaultError::ZeroAmount);
        }
        let slot0 = self.pool.slot0();
        let spacing = self.pool.fee_tier().tick_spacing;
        let (tick_lower, tick_upper) =
            range_around(slot0.tick, spacing, self.config.range_width_ticks);
        let amount1 = token1_for_token0(amount0, slot0.sqrt_price_x96)?;

        debug!(
            tick = slot0.tick,
            tick_lower,
            tick_upper,
            amount0 = %amount0,
            amount1 = %amount1,
            "Opening range around current price"
        );
        self.add_liquidity(amount0, amount1, tick_lower, tick_upper)
    }

    /// Moves all liquidity into `[new_tick_lower, new_tick_upper)`.
    ///
    /// The new mint is checked against the manager's balances before the old
    /// range is burned. If the pool still refuses it, the released tokens are
    /// minted back into the old range and the bookkeeping follows whatever
    /// liquidity the pool then holds.
    ///
    /// With `collect_before_redeploy` off, fees owed on the old range are
    /// compounded into the new one and counted in the next round.
    pub fn redeploy_liquidity(
        &mut self,
        new_tick_lower: i32,
        new_tick_upper: i32,
    ) -> Result<Redeployment, VaultError> {
        let range = self.state.range.ok_or(VaultError::NoActiveRange)?;
        check_ticks(new_tick_lower, new_tick_upper)?;
        if range.liquidity == 0 {
            return Err(VaultError::ZeroLiquidity);
        }

        let compound = !self.config.collect_before_redeploy;
        let slot0 = self.pool.slot0();
        let (principal0, principal1) = get_amounts_for_liquidity(
            slot0.sqrt_price_x96,
            sqrt_ratio_at_tick(range.tick_lower)?,
            sqrt_ratio_at_tick(range.tick_upper)?,
            range.liquidity,
            false,
        )?;
        let (owed0, owed1) = if compound {
            self.pool
                .position(self.address, range.tick_lower, range.tick_upper)
                .map(|owed| (owed.tokens_owed0, owed.tokens_owed1))
                .unwrap_or_default()
        } else {
            (U256::zero(), U256::zero())
        };
        let withdrawn0 = principal0.saturating_add(owed0);
        let withdrawn1 = principal1.saturating_add(owed1);

        let new_liquidity = liquidity_for(
            slot0.sqrt_price_x96,
            new_tick_lower,
            new_tick_upper,
            withdrawn0,
            withdrawn1,
        )?;
        if new_liquidity == 0 {
            return Err(VaultError::ZeroLiquidity);
        }
        let new_range =
            PoolRange::new(new_tick_lower, new_tick_upper, self.pool.address())?.with_liquidity(new_liquidity);
        let (needed0, needed1) = get_amounts_for_liquidity(
            slot0.sqrt_price_x96,
            sqrt_ratio_at_tick(new_tick_lower)?,
            sqrt_ratio_at_tick(new_tick_upper)?,
            new_liquidity,
            true,
        )?;
        self.ensure_balance(&self.token0, needed0.saturating_sub(withdrawn0))?;
        self.ensure_balance(&self.token1, needed1.saturating_sub(withdrawn1))?;

        let (fees0, fees1) = if compound {
            (owed0, owed1)
        } else {
            self.settle_fees()?
        };

        let released = self.pool.burn(
            self.address,
            range.tick_lower,
            range.tick_upper,
            range.liquidity,
        )?;
        let collected = match self.pool.collect(
            self.address,
            self.address,
            range.tick_lower,
            range.tick_upper,
            U256::MAX,
            U256::MAX,
        ) {
            Ok(collected) => collected,
            Err(err) => {
                self.restore_range(range, released, (U256::zero(), U256::zero()));
                return Err(err.into());
            }
        };
        let (deployed0, deployed1) = match self.pool.mint(
            self.address,
            self.address,
            new_tick_lower,
            new_tick_upper,
            new_liquidity,
        ) {
            Ok(deployed) => deployed,
            Err(err) => {
                self.restore_range(range, released, collected);
                return Err(err.into());
            }
        };

        self.state.range = Some(new_range);
        if compound {
            // Compounded fees raise the range's liquidity, not the per-share growth.
            self.state.pending_fees0 = self.state.pending_fees0.saturating_add(fees0);
            self.state.pending_fees1 = self.state.pending_fees1.saturating_add(fees1);
        }

        info!(
            manager = ?self.address,
            old_range = format!("[{}, {})", range.tick_lower, range.tick_upper),
            new_range = format!("[{new_tick_lower}, {new_tick_upper})"),
            old_liquidity = range.liquidity,
            new_liquidity,
            compounded = compound,
            "Liquidity redeployed"
        );
        Ok(Redeployment {
            old_tick_lower: range.tick_lower,
            old_tick_upper: range.tick_upper,
            new_tick_lower,
            new_tick_upper,
            old_liquidity: range.liquidity,
            new_liquidity,
            withdrawn0: collected.0,
            withdrawn1: collected.1,
            deployed0,
            deployed1,
            fees0,
            fees1,
        })
    }

    /// Mints the tokens burned out of `range` back into it after a failed
    /// move. Anything collected beyond the burned principal is settled as fees.
    fn restore_range(&mut self, range: PoolRange, released: (U256, U256), collected: (U256, U256)) {
        let late = match self.pool.collect(
            self.address,
            self.address,
            range.tick_lower,
            range.tick_upper,
            U256::MAX,
            U256::MAX,
        ) {
            Ok(late) => late,
            Err(err) => {
                warn!(manager = ?self.address, error = %err, "Collect after failed redeploy refused");
                (U256::zero(), U256::zero())
            }
        };
        let fees0 = collected.0.saturating_add(late.0).saturating_sub(released.0);
        let fees1 = collected.1.saturating_add(late.1).saturating_sub(released.1);
        if let Err(err) = self.accrue(fees0, fees1) {
            warn!(manager = ?self.address, error = %err, "Fees from failed redeploy not credited");
        }

        let sqrt_price_x96 = self.pool.slot0().sqrt_price_x96;
        let restored = liquidity_for(
            sqrt_price_x96,
            range.tick_lower,
            range.tick_upper,
            released.0,
            released.1,
        )
        .map_err(VaultError::from)
        .and_then(|liquidity| {
            if liquidity > 0 {
                self.pool.mint(
                    self.address,
                    self.address,
                    range.tick_lower,
                    range.tick_upper,
                    liquidity,
                )?;
            }
            Ok(liquidity)
        });

        let liquidity = match restored {
            Ok(liquidity) => {
                warn!(
                    manager = ?self.address,
                    liquidity,
                    previous = range.liquidity,
                    "Redeploy failed, old range restored"
                );
                liquidity
            }
            Err(err) => {
                error!(
                    manager = ?self.address,
                    error = %err,
                    amount0 = %released.0,
                    amount1 = %released.1,
                    "Redeploy failed, released tokens held by manager"
                );
                0
            }
        };
        self.state.range = Some(range.with_liquidity(liquidity));
    }

    /// Collects the range's fees and closes a yield round.
    ///
    /// Fees settled by deposits, redemptions and redeploys since the last
    /// round are included. A round is recorded even when no fees were earned.
    pub fn collect_fees(&mut self) -> Result<YieldRecord, VaultError> {
        if self.state.range.is_none() {
            return Err(VaultError::NoActiveRange);
        }
        self.settle_fees()?;

        let fees0 = std::mem::take(&mut self.state.pending_fees0);
        let fees1 = std::mem::take(&mut self.state.pending_fees1);
        let record = self.state.ledger.record(
            fees0,
            fees1,
            self.current_liquidity(),
            self.clock.now(),
        );

        info!(
            manager = ?self.address,
            round = record.round_index,
            fees0 = %record.fees0,
            fees1 = %record.fees1,
            liquidity = record.liquidity_snapshot,
            "Fees collected"
        );
        Ok(record)
    }

    /// Burns the liquidity behind `shares` and pays it, plus the fees the
    /// shares accrued since `entry_growth_x128`, to `recipient`.
    pub fn redeem_shares(
        &mut self,
        shares: u128,
        entry_growth_x128: (U256, U256),
        recipient: Address,
    ) -> Result<Withdrawal, VaultError> {
        let range = self.state.range.ok_or(VaultError::NoActiveRange)?;
        if shares == 0 {
            return Err(VaultError::ZeroAmount);
        }
        if shares > self.state.total_shares {
            return Err(VaultError::InsufficientShares {
                available: self.state.total_shares,
                requested: shares,
            });
        }

        self.settle_fees()?;

        let liquidity = to_u128(
            mul_div(
                U256::from(range.liquidity),
                U256::from(shares),
                U256::from(self.state.total_shares),
            )?,
            "redeemed liquidity",
        )?;
        let fees0 = mul_div(
            U256::from(shares),
            self.state.fee_growth0_x128.overflowing_sub(entry_growth_x128.0).0,
            Q128,
        )?;
        let fees1 = mul_div(
            U256::from(shares),
            self.state.fee_growth1_x128.overflowing_sub(entry_growth_x128.1).0,
            Q128,
        )?;

        let held = self
            .pool
            .position(self.address, range.tick_lower, range.tick_upper)
            .map(|position| position.liquidity)
            .unwrap_or_default();
        if held < liquidity {
            return Err(ProtocolError::InsufficientPositionLiquidity {
                available: held,
                requested: liquidity,
            }
            .into());
        }
        self.ensure_balance(&self.token0, fees0)?;
        self.ensure_balance(&self.token1, fees1)?;

        // Fees are paid before the burn so a refused transfer leaves the
        // range untouched.
        let withdrawal = self.transact(|manager| {
            manager.state.total_shares -= shares;
            manager.state.range = Some(range.with_liquidity(range.liquidity - liquidity));

            if !fees0.is_zero() {
                manager.token0.transfer(manager.address, recipient, fees0)?;
            }
            if !fees1.is_zero() {
                manager.token1.transfer(manager.address, recipient, fees1)?;
            }
            let (amount0, amount1) = if liquidity > 0 {
                let (owed0, owed1) = manager.pool.burn(
                    manager.address,
                    range.tick_lower,
                    range.tick_upper,
                    liquidity,
                )?;
                manager.pool.collect(
                    manager.address,
                    recipient,
                    range.tick_lower,
                    range.tick_upper,
                    owed0,
                    owed1,
                )?
            } else {
                (U256::zero(), U256::zero())
            };

            Ok(Withdrawal {
                shares,
                liquidity,
                amount0,
                amount1,
                fees0,
                fees1,
            })
        })?;

        info!(
            manager = ?self.address,
            recipient = ?recipient,
            shares,
            liquidity,
            fees0 = %fees0,
            fees1 = %fees1,
            "Shares redeemed"
        );
        Ok(withdrawal)
    }

    /// Expected fees for a hypothetical deposit into `[tick_lower, tick_upper)`
    /// over `periods` rounds, extrapolated from this manager's ledger.
    pub fn quote(
        &self,
        amount0: U256,
        amount1: U256,
        tick_lower: i32,
        tick_upper: i32,
        periods: u64,
    ) -> Result<Quote, VaultError> {
        let slot0 = self.pool.slot0();
        self.quotes.quote(
            &self.state.ledger,
            slot0.sqrt_price_x96,
            amount0,
            amount1,
            tick_lower,
            tick_upper,
            periods,
        )
    }

    pub fn quote_config(&self) -> &QuoteConfig {
        self.quotes.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use clmm_vault_domain::fees::FeeTier;
    use clmm_vault_domain::math::Q96;
    use clmm_vault_domain::token::Token;
    use clmm_vault_protocols::local::{LocalPool, LocalToken};
    use clmm_vault_protocols::{PoolPosition, Slot0};
    use std::sync::atomic::{AtomicU32, Ordering};

    const TRADER: u64 = 11;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn units(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    struct Fixture {
        pool: Arc<LocalPool>,
        manager: PositionManager,
    }

    fn local_pool() -> Arc<LocalPool> {
        let token0 = Arc::new(LocalToken::new(Token::new(addr(1), "TKA", 18, "Token A")));
        let token1 = Arc::new(LocalToken::new(Token::new(addr(2), "TKB", 18, "Token B")));
        Arc::new(LocalPool::new(addr(100), token0, token1, FeeTier::LOW, Q96).unwrap())
    }

    fn fund(pool: &LocalPool, accounts: &[Address]) {
        for account in accounts {
            pool.local_token0().mint(*account, units(1_000_000));
            pool.local_token1().mint(*account, units(1_000_000));
        }
    }

    fn fixture_with(config: ManagerConfig) -> Fixture {
        let pool = local_pool();
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let manager = PositionManager::new(pool.clone(), config, QuoteConfig::default(), clock);
        fund(&pool, &[manager.address(), addr(TRADER)]);
        Fixture { pool, manager }
    }

    fn fixture() -> Fixture {
        fixture_with(ManagerConfig::default())
    }

    /// Local pool that refuses the next `refused_mints` mints.
    struct FlakyPool {
        inner: Arc<LocalPool>,
        refused_mints: AtomicU32,
    }

    impl PoolClient for FlakyPool {
        fn address(&self) -> Address {
            self.inner.address()
        }

        fn token0(&self) -> Arc<dyn TokenClient> {
            self.inner.token0()
        }

        fn token1(&self) -> Arc<dyn TokenClient> {
            self.inner.token1()
        }

        fn fee_tier(&self) -> FeeTier {
            self.inner.fee_tier()
        }

        fn slot0(&self) -> Slot0 {
            self.inner.slot0()
        }

        fn position(&self, owner: Address, tick_lower: i32, tick_upper: i32) -> Option<PoolPosition> {
            self.inner.position(owner, tick_lower, tick_upper)
        }

        fn mint(
            &self,
            caller: Address,
            recipient: Address,
            tick_lower: i32,
            tick_upper: i32,
            liquidity: u128,
        ) -> Result<(U256, U256), ProtocolError> {
            let refused = self
                .refused_mints
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if refused {
                return Err(ProtocolError::NoLiquidity);
            }
            self.inner.mint(caller, recipient, tick_lower, tick_upper, liquidity)
        }

        fn burn(
            &self,
            caller: Address,
            tick_lower: i32,
            tick_upper: i32,
            liquidity: u128,
        ) -> Result<(U256, U256), ProtocolError> {
            self.inner.burn(caller, tick_lower, tick_upper, liquidity)
        }

        fn collect(
            &self,
            caller: Address,
            recipient: Address,
            tick_lower: i32,
            tick_upper: i32,
            amount0_requested: U256,
            amount1_requested: U256,
        ) -> Result<(U256, U256), ProtocolError> {
            self.inner.collect(
                caller,
                recipient,
                tick_lower,
                tick_upper,
                amount0_requested,
                amount1_requested,
            )
        }
    }

    fn flaky_fixture() -> (Arc<LocalPool>, Arc<FlakyPool>, PositionManager) {
        let inner = local_pool();
        let flaky = Arc::new(FlakyPool {
            inner: inner.clone(),
            refused_mints: AtomicU32::new(0),
        });
        let manager = PositionManager::new(
            flaky.clone(),
            ManagerConfig::default(),
            QuoteConfig::default(),
            Arc::new(ManualClock::new(1_700_000_000)),
        );
        fund(&inner, &[manager.address()]);
        (inner, flaky, manager)
    }

    #[test]
    fn test_add_liquidity_opens_range() {
        let Fixture { pool, mut manager } = fixture();
        assert_eq!(manager.current_liquidity(), 0);

        let change = manager
            .add_liquidity(units(1000), units(1000), -600, 600)
            .unwrap();

        assert!(change.liquidity > 0);
        assert_eq!(manager.current_liquidity(), change.liquidity);
        assert_eq!(manager.total_shares(), change.liquidity);
        assert_eq!(manager.tick_lower(), Some(-600));
        assert_eq!(manager.tick_upper(), Some(600));
        assert_eq!(manager.pool_address(), addr(100));
        assert_eq!(
            pool.position(manager.address(), -600, 600).unwrap().liquidity,
            change.liquidity
        );
    }

    #[test]
    fn test_add_liquidity_preconditions() {
        let Fixture { mut manager, .. } = fixture();

        assert!(matches!(
            manager.add_liquidity(units(1), units(1), 600, -600),
            Err(VaultError::Domain(DomainError::InvalidTickRange { .. }))
        ));
        assert_eq!(
            manager.add_liquidity(U256::zero(), U256::zero(), -600, 600),
            Err(VaultError::ZeroAmount)
        );

        manager.add_liquidity(units(1), units(1), -600, 600).unwrap();
        assert_eq!(
            manager.add_liquidity(units(1), units(1), -60, 60),
            Err(VaultError::RangeActive {
                tick_lower: -600,
                tick_upper: 600
            })
        );
    }

    #[test]
    fn test_increase_by_five_times_capital_adds_five_times_liquidity() {
        let Fixture { mut manager, .. } = fixture();
        let initial = manager
            .add_liquidity(units(1000), units(1), 1000, 2000)
            .unwrap();

        let added = manager
            .increase_liquidity(units(5000), units(5))
            .unwrap();

        // Five times the capital adds five times the liquidity; the range
        // then holds six times the original.
        assert_eq!(added.liquidity / initial.liquidity, 5);
        assert_eq!(added.shares, added.liquidity);
        assert_eq!(manager.current_liquidity(), initial.liquidity + added.liquidity);
        assert_eq!((added.tick_lower, added.tick_upper), (1000, 2000));
    }

    #[test]
    fn test_increase_requires_range() {
        let Fixture { mut manager, .. } = fixture();
        assert_eq!(
            manager.increase_liquidity(units(1), units(1)),
            Err(VaultError::NoActiveRange)
        );
    }

    #[test]
    fn test_failed_mint_restores_bookkeeping() {
        let Fixture { mut manager, .. } = fixture();
        manager.add_liquidity(units(1000), units(1000), -500, 500).unwrap();
        let (liquidity, shares) = (manager.current_liquidity(), manager.total_shares());

        let err = manager
            .increase_liquidity(units(2_000_000), units(2_000_000))
            .unwrap_err();

        assert!(matches!(
            err,
            VaultError::Protocol(ProtocolError::InsufficientBalance { .. })
        ));
        assert_eq!(manager.current_liquidity(), liquidity);
        assert_eq!(manager.total_shares(), shares);
    }

    #[test]
    fn test_range_around_current_price_is_aligned() {
        let Fixture { mut manager, .. } = fixture();
        let change = manager.add_liquidity_around_current_price(units(100)).unwrap();

        assert_eq!((change.tick_lower, change.tick_upper), (-500, 500));
        assert!(change.liquidity > 0);
        assert!(change.amount0 > U256::zero());
        assert!(change.amount1 > U256::zero());
    }

    #[test]
    fn test_range_around_helper() {
        assert_eq!(range_around(201_005, 10, 1000), (200_500, 201_500));
        assert_eq!(range_around(-7, 10, 1000), (-510, 490));
        // Narrower than the spacing still spans one spacing each side
        assert_eq!(range_around(0, 60, 10), (-60, 60));
    }

    #[test]
    fn test_redeploy_moves_all_liquidity() {
        let Fixture { pool, mut manager } = fixture();
        manager.add_liquidity_around_current_price(units(100)).unwrap();
        let lower = manager.tick_lower().unwrap();
        let upper = manager.tick_upper().unwrap();

        let moved = manager.redeploy_liquidity(lower - 5, upper - 5).unwrap();

        assert_eq!(manager.tick_lower(), Some(lower - 5));
        assert_eq!(manager.tick_upper(), Some(upper - 5));
        assert!(manager.current_liquidity() > 0);
        assert_eq!(manager.current_liquidity(), moved.new_liquidity);
        assert_eq!(pool.position(manager.address(), lower, upper).unwrap().liquidity, 0);
        assert_eq!(
            pool.position(manager.address(), lower - 5, upper - 5).unwrap().liquidity,
            moved.new_liquidity
        );
    }

    #[test]
    fn test_redeploy_failures_leave_range_untouched() {
        let Fixture { mut manager, .. } = fixture();
        assert_eq!(
            manager.redeploy_liquidity(-10, 10),
            Err(VaultError::NoActiveRange)
        );

        manager.add_liquidity(units(10), units(10), -600, 600).unwrap();
        let before = *manager.range().unwrap();
        assert!(manager.redeploy_liquidity(10, -10).is_err());
        assert_eq!(*manager.range().unwrap(), before);
    }

    #[test]
    fn test_refused_mint_restores_old_range() {
        let (inner, flaky, mut manager) = flaky_fixture();
        let opened = manager.add_liquidity(units(1000), units(1000), -600, 600).unwrap();
        flaky.refused_mints.store(1, Ordering::SeqCst);

        assert_eq!(
            manager.redeploy_liquidity(-605, 595),
            Err(VaultError::Protocol(ProtocolError::NoLiquidity))
        );

        let held = inner.position(manager.address(), -600, 600).unwrap().liquidity;
        assert_eq!((manager.tick_lower(), manager.tick_upper()), (Some(-600), Some(600)));
        assert_eq!(manager.current_liquidity(), held);
        assert!(held <= opened.liquidity);
        assert!(opened.liquidity - held < opened.liquidity / 1_000_000);
        assert!(inner.position(manager.address(), -605, 595).is_none());

        // Depositors can still leave.
        let withdrawal = manager
            .redeem_shares(opened.shares, (U256::zero(), U256::zero()), addr(50))
            .unwrap();
        assert_eq!(withdrawal.liquidity, held);
        assert_eq!(inner.position(manager.address(), -600, 600).unwrap().liquidity, 0);
    }

    #[test]
    fn test_unrecoverable_redeploy_matches_pool() {
        let (inner, flaky, mut manager) = flaky_fixture();
        manager.add_liquidity(units(1000), units(1000), -600, 600).unwrap();
        let balance0 = inner.local_token0().balance_of(manager.address());
        flaky.refused_mints.store(2, Ordering::SeqCst);

        assert!(manager.redeploy_liquidity(-605, 595).is_err());

        assert_eq!(manager.tick_lower(), Some(-600));
        assert_eq!(manager.current_liquidity(), 0);
        assert_eq!(inner.position(manager.address(), -600, 600).unwrap().liquidity, 0);
        assert!(inner.local_token0().balance_of(manager.address()) > balance0);
    }

    #[test]
    fn test_compounding_redeploy_counts_fees_next_round() {
        let Fixture { pool, mut manager } = fixture_with(ManagerConfig {
            collect_before_redeploy: false,
            ..ManagerConfig::default()
        });
        manager.add_liquidity_around_current_price(units(1000)).unwrap();
        let swap = pool.swap(addr(TRADER), true, units(10)).unwrap();

        let moved = manager.redeploy_liquidity(-505, 495).unwrap();

        assert_eq!(moved.fees0, swap.fee);
        assert!(moved.fees1.is_zero());
        assert!(moved.withdrawn0 >= swap.fee);
        assert_eq!(manager.current_liquidity(), moved.new_liquidity);
        // Compounded fees grow the range, not the per-share accumulator.
        assert_eq!(manager.fee_growth_x128(), (U256::zero(), U256::zero()));

        let round = manager.collect_fees().unwrap();
        assert_eq!(round.fees0, swap.fee);
        assert!(round.fees1.is_zero());
    }

    #[test]
    fn test_rejected_increase_settles_nothing() {
        let Fixture { pool, mut manager } = fixture();
        manager.add_liquidity_around_current_price(units(1000)).unwrap();
        pool.swap(addr(TRADER), true, units(1)).unwrap();
        let owed = pool.position(manager.address(), -500, 500).unwrap().tokens_owed0;
        assert!(owed > U256::zero());

        assert_eq!(
            manager.increase_liquidity(U256::one(), U256::zero()),
            Err(VaultError::ZeroLiquidity)
        );
        assert_eq!(manager.fee_growth_x128(), (U256::zero(), U256::zero()));
        assert_eq!(
            pool.position(manager.address(), -500, 500).unwrap().tokens_owed0,
            owed
        );
    }

    #[test]
    fn test_refused_fee_payout_leaves_range_untouched() {
        let Fixture { pool, mut manager } = fixture();
        let opened = manager.add_liquidity(units(10), units(10), -600, 600).unwrap();
        let token0 = pool.local_token0();
        let spare = token0.balance_of(manager.address());
        token0.transfer(manager.address(), addr(77), spare).unwrap();
        // Shares entered five token0 per share behind the current growth.
        let entry = (U256::zero().overflowing_sub(Q128 * U256::from(5)).0, U256::zero());

        let err = manager.redeem_shares(opened.shares, entry, addr(50)).unwrap_err();

        assert!(matches!(
            err,
            VaultError::Protocol(ProtocolError::InsufficientBalance { .. })
        ));
        assert_eq!(manager.total_shares(), opened.shares);
        assert_eq!(manager.current_liquidity(), opened.liquidity);
        assert_eq!(
            pool.position(manager.address(), -600, 600).unwrap().liquidity,
            opened.liquidity
        );
        assert!(token0.balance_of(addr(50)).is_zero());
    }

    #[test]
    fn test_redeploy_of_empty_range_fails() {
        let Fixture { mut manager, .. } = fixture();
        let change = manager.add_liquidity(units(10), units(10), -600, 600).unwrap();
        manager
            .redeem_shares(change.shares, (U256::zero(), U256::zero()), addr(50))
            .unwrap();

        assert_eq!(manager.current_liquidity(), 0);
        assert_eq!(
            manager.redeploy_liquidity(-1200, 1200),
            Err(VaultError::ZeroLiquidity)
        );
    }

    #[test]
    fn test_collect_fees_records_rounds() {
        let Fixture { pool, mut manager } = fixture();
        assert_eq!(manager.collect_fees(), Err(VaultError::NoActiveRange));
        manager.add_liquidity_around_current_price(units(1000)).unwrap();

        let quiet = manager.collect_fees().unwrap();
        assert_eq!(quiet.round_index, 0);
        assert!(!quiet.has_fees());

        let swap = pool.swap(addr(TRADER), true, units(1)).unwrap();
        let busy = manager.collect_fees().unwrap();

        assert_eq!(busy.round_index, 1);
        assert_eq!(busy.fees0, swap.fee);
        assert!(busy.fees1.is_zero());
        assert_eq!(busy.liquidity_snapshot, manager.current_liquidity());
        assert_eq!(busy.timestamp, 1_700_000_000);
        assert_eq!(manager.yield_history(1), busy);
        assert!(manager.yield_history(2).is_zero());
    }

    #[test]
    fn test_redeemed_shares_earn_their_slice_of_fees() {
        let Fixture { pool, mut manager } = fixture();
        let seed = manager.add_liquidity_around_current_price(units(1000)).unwrap();
        let deposit = manager.increase_liquidity(units(1000), units(1000)).unwrap();
        let entry = manager.fee_growth_x128();

        let swap = pool.swap(addr(TRADER), true, units(1)).unwrap();
        let recipient = addr(50);
        let withdrawal = manager
            .redeem_shares(deposit.shares, entry, recipient)
            .unwrap();

        let total_shares = U256::from(seed.shares + deposit.shares);
        let fair = swap.fee * U256::from(deposit.shares) / total_shares;
        assert!(withdrawal.fees0 <= fair);
        assert!(fair - withdrawal.fees0 <= U256::one());
        assert!(withdrawal.fees1.is_zero());
        assert!(withdrawal.amount0 > U256::zero());
        assert!(withdrawal.amount1 > U256::zero());

        let token0 = pool.local_token0();
        assert_eq!(token0.balance_of(recipient), withdrawal.amount0 + withdrawal.fees0);
        assert_eq!(manager.total_shares(), seed.shares);

        // Settled fees are not a round of their own but roll into the next one.
        assert_eq!(manager.ledger().rounds(), 0);
        assert_eq!(manager.collect_fees().unwrap().fees0, swap.fee);
    }

    #[test]
    fn test_redeem_more_than_outstanding_fails() {
        let Fixture { mut manager, .. } = fixture();
        let change = manager.add_liquidity(units(10), units(10), -600, 600).unwrap();
        assert_eq!(
            manager.redeem_shares(change.shares + 1, (U256::zero(), U256::zero()), addr(50)),
            Err(VaultError::InsufficientShares {
                available: change.shares,
                requested: change.shares + 1
            })
        );
    }

    #[test]
    fn test_quote_uses_recorded_rounds() {
        let Fixture { pool, mut manager } = fixture();
        manager.add_liquidity_around_current_price(units(1000)).unwrap();

        let before = manager.quote(units(10), units(10), -500, 500, 30).unwrap();
        assert!(!before.is_estimated());
        assert!(before.fees0.is_zero());

        pool.swap(addr(TRADER), true, units(100)).unwrap();
        manager.collect_fees().unwrap();

        let after = manager.quote(units(10), units(10), -500, 500, 30).unwrap();
        assert!(after.is_estimated());
        assert!(after.fees0 > U256::zero());
    }
}
