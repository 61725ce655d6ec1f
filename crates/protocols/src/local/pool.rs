use crate::error::ProtocolError;
use crate::local::swap_math::compute_swap_step;
use crate::local::token::LocalToken;
use crate::pool::{PoolClient, PoolPosition, Slot0};
use crate::token::TokenClient;
use clmm_vault_domain::U256;
use clmm_vault_domain::error::DomainError;
use clmm_vault_domain::fees::FeeTier;
use clmm_vault_domain::math::concentrated_liquidity::get_amounts_for_liquidity;
use clmm_vault_domain::math::full_math::mul_div;
use clmm_vault_domain::math::tick_math::{
    MAX_SQRT_RATIO, MIN_SQRT_RATIO, check_ticks, sqrt_ratio_at_tick, tick_at_sqrt_ratio,
};
use clmm_vault_domain::token::Address;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tracing::debug;

type PositionKey = (Address, i32, i32);

#[derive(Debug, Clone)]
struct PoolState {
    sqrt_price_x96: U256,
    tick: i32,
    liquidity: u128,
    /// Liquidity change applied when the price crosses each tick upward.
    liquidity_net: BTreeMap<i32, i128>,
    positions: HashMap<PositionKey, PoolPosition>,
}

impl PoolState {
    fn apply_liquidity_delta(
        &mut self,
        tick_lower: i32,
        tick_upper: i32,
        delta: i128,
    ) -> Result<(), DomainError> {
        for (tick, change) in [(tick_lower, delta), (tick_upper, -delta)] {
            let updated = self
                .liquidity_net
                .get(&tick)
                .copied()
                .unwrap_or_default()
                .checked_add(change)
                .ok_or(DomainError::Overflow("liquidity net"))?;
            if updated == 0 {
                self.liquidity_net.remove(&tick);
            } else {
                self.liquidity_net.insert(tick, updated);
            }
        }

        if self.tick >= tick_lower && self.tick < tick_upper {
            self.liquidity = add_delta(self.liquidity, delta)?;
        }
        Ok(())
    }

    /// Splits `fee` across positions active at the current tick, pro rata
    /// to their liquidity. Rounding dust stays with the pool.
    fn credit_fee(&mut self, fee: U256, zero_for_one: bool) -> Result<(), DomainError> {
        if fee.is_zero() || self.liquidity == 0 {
            return Ok(());
        }
        let (tick, active) = (self.tick, U256::from(self.liquidity));

        for ((_, lower, upper), position) in self.positions.iter_mut() {
            if position.liquidity == 0 || tick < *lower || tick >= *upper {
                continue;
            }
            let share = mul_div(fee, U256::from(position.liquidity), active)?;
            if zero_for_one {
                position.tokens_owed0 = position.tokens_owed0.saturating_add(share);
            } else {
                position.tokens_owed1 = position.tokens_owed1.saturating_add(share);
            }
        }
        Ok(())
    }
}

fn add_delta(liquidity: u128, delta: i128) -> Result<u128, DomainError> {
    let updated = if delta < 0 {
        liquidity.checked_sub(delta.unsigned_abs())
    } else {
        liquidity.checked_add(delta.unsigned_abs())
    };
    updated.ok_or(DomainError::Overflow("active liquidity"))
}

fn to_delta(liquidity: u128) -> Result<i128, DomainError> {
    i128::try_from(liquidity).map_err(|_| DomainError::Overflow("liquidity delta"))
}

/// Outcome of an exact-input swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub zero_for_one: bool,
    /// Input taken from the trader, fee included.
    pub amount_in: U256,
    pub amount_out: U256,
    /// Portion of `amount_in` paid as fee.
    pub fee: U256,
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

/// Concentrated liquidity pool evaluated in process.
#[derive(Debug)]
pub struct LocalPool {
    address: Address,
    token0: Arc<LocalToken>,
    token1: Arc<LocalToken>,
    fee_tier: FeeTier,
    state: RwLock<PoolState>,
}

impl LocalPool {
    /// Creates an empty pool at `sqrt_price_x96` (token1 per token0).
    pub fn new(
        address: Address,
        token0: Arc<LocalToken>,
        token1: Arc<LocalToken>,
        fee_tier: FeeTier,
        sqrt_price_x96: U256,
    ) -> Result<Self, ProtocolError> {
        let tick = tick_at_sqrt_ratio(sqrt_price_x96)?;
        Ok(Self {
            address,
            token0,
            token1,
            fee_tier,
            state: RwLock::new(PoolState {
                sqrt_price_x96,
                tick,
                liquidity: 0,
                liquidity_net: BTreeMap::new(),
                positions: HashMap::new(),
            }),
        })
    }

    pub fn local_token0(&self) -> &Arc<LocalToken> {
        &self.token0
    }

    pub fn local_token1(&self) -> &Arc<LocalToken> {
        &self.token1
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, PoolState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_balance(
        token: &LocalToken,
        account: Address,
        amount: U256,
    ) -> Result<(), ProtocolError> {
        let available = token.balance_of(account);
        if available < amount {
            return Err(ProtocolError::InsufficientBalance {
                token: token.address(),
                account,
                required: amount,
                available,
            });
        }
        Ok(())
    }

    fn amounts_for(
        state: &PoolState,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
        round_up: bool,
    ) -> Result<(U256, U256), DomainError> {
        get_amounts_for_liquidity(
            state.sqrt_price_x96,
            sqrt_ratio_at_tick(tick_lower)?,
            sqrt_ratio_at_tick(tick_upper)?,
            liquidity,
            round_up,
        )
    }

    /// Swaps exactly `amount_in` of one token for the other, paid by `caller`.
    ///
    /// The swap stops early if the price reaches the end of the tick range;
    /// `SwapOutcome::amount_in` reports what was actually consumed.
    pub fn swap(
        &self,
        caller: Address,
        zero_for_one: bool,
        amount_in: U256,
    ) -> Result<SwapOutcome, ProtocolError> {
        if amount_in.is_zero() {
            return Err(ProtocolError::ZeroAmount);
        }
        let (token_in, token_out) = if zero_for_one {
            (&self.token0, &self.token1)
        } else {
            (&self.token1, &self.token0)
        };
        Self::ensure_balance(token_in, caller, amount_in)?;

        let mut state = self.write_state();
        if state.liquidity_net.is_empty() {
            return Err(ProtocolError::NoLiquidity);
        }

        let mut working = state.clone();
        let limit = if zero_for_one {
            MIN_SQRT_RATIO + U256::one()
        } else {
            MAX_SQRT_RATIO - U256::one()
        };
        let mut remaining = amount_in;
        let (mut total_in, mut total_out, mut total_fee) = (U256::zero(), U256::zero(), U256::zero());

        while !remaining.is_zero() && working.sqrt_price_x96 != limit {
            let next = if zero_for_one {
                working.liquidity_net.range(..=working.tick).next_back()
            } else {
                working.liquidity_net.range(working.tick + 1..).next()
            }
            .map(|(tick, net)| (*tick, *net));

            let (target, crossing) = match next {
                Some((tick, net)) => {
                    let sqrt = sqrt_ratio_at_tick(tick)?;
                    let beyond_limit = if zero_for_one { sqrt < limit } else { sqrt > limit };
                    if beyond_limit {
                        (limit, None)
                    } else {
                        (sqrt, Some((tick, net)))
                    }
                }
                None => (limit, None),
            };

            let sqrt_start = working.sqrt_price_x96;
            let step = compute_swap_step(
                sqrt_start,
                target,
                working.liquidity,
                remaining,
                self.fee_tier.fee_pips,
            )?;

            let consumed = step.amount_in + step.fee_amount;
            remaining = remaining.saturating_sub(consumed);
            total_in += consumed;
            total_out += step.amount_out;
            total_fee += step.fee_amount;
            working.credit_fee(step.fee_amount, zero_for_one)?;
            working.sqrt_price_x96 = step.sqrt_price_next;

            match crossing {
                Some((tick, net)) if step.sqrt_price_next == target => {
                    if zero_for_one {
                        working.liquidity = add_delta(working.liquidity, -net)?;
                        working.tick = tick - 1;
                    } else {
                        working.liquidity = add_delta(working.liquidity, net)?;
                        working.tick = tick;
                    }
                }
                _ => {
                    if step.sqrt_price_next != sqrt_start {
                        working.tick = tick_at_sqrt_ratio(step.sqrt_price_next)?;
                    }
                }
            }
        }

        let reserves = token_out.balance_of(self.address);
        if reserves < total_out {
            return Err(ProtocolError::InsufficientReserves(total_out));
        }
        token_in.transfer(caller, self.address, total_in)?;
        token_out.transfer(self.address, caller, total_out)?;
        *state = working;

        debug!(
            pool = ?self.address,
            zero_for_one,
            amount_in = %total_in,
            amount_out = %total_out,
            fee = %total_fee,
            tick = state.tick,
            "Swap executed"
        );

        Ok(SwapOutcome {
            zero_for_one,
            amount_in: total_in,
            amount_out: total_out,
            fee: total_fee,
            sqrt_price_x96: state.sqrt_price_x96,
            tick: state.tick,
        })
    }
}

impl PoolClient for LocalPool {
    fn address(&self) -> Address {
        self.address
    }

    fn token0(&self) -> Arc<dyn TokenClient> {
        self.token0.clone()
    }

    fn token1(&self) -> Arc<dyn TokenClient> {
        self.token1.clone()
    }

    fn fee_tier(&self) -> FeeTier {
        self.fee_tier
    }

    fn slot0(&self) -> Slot0 {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Slot0 {
            sqrt_price_x96: state.sqrt_price_x96,
            tick: state.tick,
            liquidity: state.liquidity,
        }
    }

    fn position(&self, owner: Address, tick_lower: i32, tick_upper: i32) -> Option<PoolPosition> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.positions.get(&(owner, tick_lower, tick_upper)).copied()
    }

    fn mint(
        &self,
        caller: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    ) -> Result<(U256, U256), ProtocolError> {
        if liquidity == 0 {
            return Err(ProtocolError::ZeroAmount);
        }
        check_ticks(tick_lower, tick_upper)?;

        let mut state = self.write_state();
        let (amount0, amount1) = Self::amounts_for(&state, tick_lower, tick_upper, liquidity, true)?;
        Self::ensure_balance(&self.token0, caller, amount0)?;
        Self::ensure_balance(&self.token1, caller, amount1)?;

        let mut updated = state.clone();
        updated.apply_liquidity_delta(tick_lower, tick_upper, to_delta(liquidity)?)?;
        let position = updated
            .positions
            .entry((recipient, tick_lower, tick_upper))
            .or_default();
        position.liquidity = position
            .liquidity
            .checked_add(liquidity)
            .ok_or(DomainError::Overflow("position liquidity"))?;

        self.token0.transfer(caller, self.address, amount0)?;
        if let Err(err) = self.token1.transfer(caller, self.address, amount1) {
            self.token0.transfer(self.address, caller, amount0)?;
            return Err(err);
        }
        *state = updated;

        debug!(
            pool = ?self.address,
            owner = ?recipient,
            tick_lower,
            tick_upper,
            liquidity,
            amount0 = %amount0,
            amount1 = %amount1,
            "Liquidity minted"
        );
        Ok((amount0, amount1))
    }

    fn burn(
        &self,
        caller: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    ) -> Result<(U256, U256), ProtocolError> {
        let mut state = self.write_state();
        let key = (caller, tick_lower, tick_upper);
        let mut position =
            state
                .positions
                .get(&key)
                .copied()
                .ok_or(ProtocolError::UnknownPosition {
                    owner: caller,
                    tick_lower,
                    tick_upper,
                })?;
        if position.liquidity < liquidity {
            return Err(ProtocolError::InsufficientPositionLiquidity {
                available: position.liquidity,
                requested: liquidity,
            });
        }

        let (amount0, amount1) =
            Self::amounts_for(&state, tick_lower, tick_upper, liquidity, false)?;
        if liquidity > 0 {
            state.apply_liquidity_delta(tick_lower, tick_upper, -to_delta(liquidity)?)?;
        }
        position.liquidity -= liquidity;
        position.tokens_owed0 = position.tokens_owed0.saturating_add(amount0);
        position.tokens_owed1 = position.tokens_owed1.saturating_add(amount1);
        state.positions.insert(key, position);

        debug!(
            pool = ?self.address,
            owner = ?caller,
            tick_lower,
            tick_upper,
            liquidity,
            amount0 = %amount0,
            amount1 = %amount1,
            "Liquidity burned"
        );
        Ok((amount0, amount1))
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
        let mut state = self.write_state();
        let key = (caller, tick_lower, tick_upper);
        let mut position =
            state
                .positions
                .get(&key)
                .copied()
                .ok_or(ProtocolError::UnknownPosition {
                    owner: caller,
                    tick_lower,
                    tick_upper,
                })?;

        let amount0 = amount0_requested.min(position.tokens_owed0);
        let amount1 = amount1_requested.min(position.tokens_owed1);
        Self::ensure_balance(&self.token0, self.address, amount0)?;
        Self::ensure_balance(&self.token1, self.address, amount1)?;

        self.token0.transfer(self.address, recipient, amount0)?;
        self.token1.transfer(self.address, recipient, amount1)?;
        position.tokens_owed0 -= amount0;
        position.tokens_owed1 -= amount1;
        state.positions.insert(key, position);

        debug!(
            pool = ?self.address,
            owner = ?caller,
            recipient = ?recipient,
            amount0 = %amount0,
            amount1 = %amount1,
            "Tokens collected"
        );
        Ok((amount0, amount1))
    }
}
