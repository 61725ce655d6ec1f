//! Deposit registry.
//!
//! The [`DepositRegistry`] owns one [`PositionManager`] per registered pair
//! and fee tier, and the table of depositor [`Position`]s. Pool registration,
//! bootstrapping and maintenance require the [`AdminCap`] issued with the
//! registry; deposits, closes and quotes are open to any caller.

use crate::clock::Clock;
use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::lifecycle::{
    DepositData, FeesCollectedData, LifecycleTracker, LiquidityData, PoolAddedData,
    PositionClosedData, RedeployData,
};
use crate::manager::{LiquidityChange, PositionManager, Redeployment, Withdrawal, address_from_id};
use crate::quote::{Quote, SingleQuote};
use clmm_vault_domain::U256;
use clmm_vault_domain::entities::{PoolKey, Position, YieldRecord};
use clmm_vault_domain::enums::PositionStatus;
use clmm_vault_domain::math::price_tick::token1_for_token0;
use clmm_vault_domain::metrics::fees::{calculate_apy, to_decimal};
use clmm_vault_domain::metrics::APY;
use clmm_vault_domain::token::Address;
use clmm_vault_protocols::{INTERFACE_VERSION, PoolFactory, TokenClient};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Authority over one registry's pool table.
#[derive(Debug)]
pub struct AdminCap {
    registry_id: Uuid,
}

impl AdminCap {
    pub fn registry_id(&self) -> Uuid {
        self.registry_id
    }
}

/// Outcome of closing a position.
#[derive(Debug, Clone)]
pub struct ClosedPosition {
    /// Position as stored after the close.
    pub position: Position,
    pub withdrawal: Withdrawal,
    pub elapsed_secs: u64,
    /// Whether the committed duration had passed.
    pub commitment_met: bool,
}

/// Registry of position managers and depositor positions.
pub struct DepositRegistry {
    id: Uuid,
    address: Address,
    factory: Arc<dyn PoolFactory>,
    clock: Arc<dyn Clock>,
    config: VaultConfig,
    pools: HashMap<PoolKey, PositionManager>,
    /// First fee tier registered for each ordered pair.
    pair_defaults: HashMap<(Address, Address), PoolKey>,
    positions: HashMap<Address, Position>,
    lifecycle: LifecycleTracker,
}

impl fmt::Debug for DepositRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DepositRegistry")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("pools", &self.pools.len())
            .field("positions", &self.positions.len())
            .finish()
    }
}

impl DepositRegistry {
    /// Creates an empty registry and the capability that administers it.
    pub fn new(
        factory: Arc<dyn PoolFactory>,
        clock: Arc<dyn Clock>,
        config: VaultConfig,
    ) -> (Self, AdminCap) {
        let id = Uuid::new_v4();
        let registry = Self {
            id,
            address: address_from_id(&id),
            factory,
            clock,
            config,
            pools: HashMap::new(),
            pair_defaults: HashMap::new(),
            positions: HashMap::new(),
            lifecycle: LifecycleTracker::new(),
        };
        info!(registry = %id, address = ?registry.address, "Deposit registry created");
        (registry, AdminCap { registry_id: id })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Account depositors approve to pull their tokens.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &LifecycleTracker {
        &self.lifecycle
    }

    /// Manager registered for `key`.
    pub fn manager(&self, key: &PoolKey) -> Option<&PositionManager> {
        self.pools.get(key)
    }

    /// Manager of the first fee tier registered for the pair.
    pub fn manager_for_pair(&self, token0: Address, token1: Address) -> Option<&PositionManager> {
        self.pair_defaults
            .get(&(token0, token1))
            .and_then(|key| self.pools.get(key))
    }

    /// Registered pool keys.
    pub fn pool_keys(&self) -> Vec<PoolKey> {
        self.pools.keys().copied().collect()
    }

    /// Position recorded for `owner`, open or closed.
    pub fn get_position(&self, owner: Address) -> Option<&Position> {
        self.positions.get(&owner)
    }

    fn authorize(&self, cap: &AdminCap) -> Result<(), VaultError> {
        if cap.registry_id != self.id {
            warn!(registry = %self.id, presented = %cap.registry_id, "Rejected capability");
            return Err(VaultError::Unauthorized);
        }
        Ok(())
    }

    fn resolve_pair(&self, token0: Address, token1: Address) -> Result<PoolKey, VaultError> {
        self.pair_defaults
            .get(&(token0, token1))
            .copied()
            .ok_or(VaultError::PairNotRegistered { token0, token1 })
    }

    fn manager_mut(&mut self, key: &PoolKey) -> Result<&mut PositionManager, VaultError> {
        self.pools
            .get_mut(key)
            .ok_or(VaultError::PoolNotRegistered(*key))
    }

    /// Registers a manager for the factory's `token0`/`token1` pool at
    /// `fee_pips`, returning the manager's account.
    ///
    /// # Errors
    /// Fails for a foreign capability, an already registered key, a pool the
    /// factory does not know, a pool on another interface version, or a pair
    /// not given in the pool's token order.
    pub fn add_pool(
        &mut self,
        cap: &AdminCap,
        token0: Address,
        token1: Address,
        fee_pips: u32,
    ) -> Result<Address, VaultError> {
        self.authorize(cap)?;
        let key = PoolKey::new(token0, token1, fee_pips);
        if self.pools.contains_key(&key) {
            return Err(VaultError::PoolExists(key));
        }

        let pool = self
            .factory
            .get_pool(token0, token1, fee_pips)
            .ok_or(VaultError::PoolNotFound(key))?;
        let found = pool.interface_version();
        if found != INTERFACE_VERSION {
            return Err(VaultError::InterfaceVersion {
                expected: INTERFACE_VERSION,
                found,
            });
        }
        let (actual0, actual1) = (pool.token0().address(), pool.token1().address());
        if (actual0, actual1) != (token0, token1) {
            return Err(VaultError::TokenOrderMismatch {
                requested: key,
                actual0,
                actual1,
            });
        }

        let pool_address = pool.address();
        let manager = PositionManager::new(
            pool,
            self.config.manager.clone(),
            self.config.quote.clone(),
            self.clock.clone(),
        );
        let manager_address = manager.address();

        self.lifecycle.record_pool_added(
            key,
            manager_address,
            self.clock.now(),
            PoolAddedData {
                pool_address,
                manager_id: manager.id(),
            },
        );
        self.pools.insert(key, manager);
        self.pair_defaults.entry((token0, token1)).or_insert(key);

        Ok(manager_address)
    }

    /// Deploys the first range around the current price from tokens the
    /// manager already holds.
    pub fn initialise_pool_at_current_price(
        &mut self,
        cap: &AdminCap,
        token0: Address,
        token1: Address,
        amount0: U256,
    ) -> Result<LiquidityChange, VaultError> {
        self.authorize(cap)?;
        let key = self.resolve_pair(token0, token1)?;
        let manager = self.manager_mut(&key)?;

        let liquidity = manager.current_liquidity();
        if liquidity > 0 {
            return Err(VaultError::AlreadyInitialised(liquidity));
        }
        let change = manager.add_liquidity_around_current_price(amount0)?;
        let manager_address = manager.address();

        self.lifecycle.record_pool_initialised(
            key,
            manager_address,
            self.clock.now(),
            LiquidityData {
                tick_lower: change.tick_lower,
                tick_upper: change.tick_upper,
                liquidity: change.liquidity,
                amount0: change.amount0,
                amount1: change.amount1,
            },
        );
        Ok(change)
    }

    /// Pulls `amount0`/`amount1` from `caller` into the pair's range and
    /// records a position for `recipient` committed for `duration` seconds.
    ///
    /// The caller must have approved the registry's address for both amounts.
    /// A recipient holds at most one open position.
    pub fn deposit(
        &mut self,
        caller: Address,
        token0: Address,
        token1: Address,
        amount0: U256,
        amount1: U256,
        recipient: Address,
        duration: u64,
    ) -> Result<Position, VaultError> {
        if amount0.is_zero() || amount1.is_zero() {
            return Err(VaultError::ZeroAmount);
        }
        let key = self.resolve_pair(token0, token1)?;
        if self.positions.get(&recipient).is_some_and(Position::is_open) {
            return Err(VaultError::PositionExists(recipient));
        }
        let spender = self.address;
        let now = self.clock.now();

        let manager = self
            .pools
            .get_mut(&key)
            .ok_or(VaultError::PoolNotRegistered(key))?;
        if manager.range().is_none() {
            return Err(VaultError::NoActiveRange);
        }

        let mut position = Position {
            owner: recipient,
            amount0,
            amount1,
            duration,
            start_time: now,
            status: PositionStatus::Open,
            pool: key,
            shares: 0,
            fee_growth0_entry_x128: U256::zero(),
            fee_growth1_entry_x128: U256::zero(),
        };
        let previous = self.positions.insert(recipient, position.clone());

        let change = match fund_range(manager, spender, caller, amount0, amount1) {
            Ok(change) => change,
            Err(err) => {
                match previous {
                    Some(previous) => self.positions.insert(recipient, previous),
                    None => self.positions.remove(&recipient),
                };
                return Err(err);
            }
        };

        let (growth0, growth1) = manager.fee_growth_x128();
        position.shares = change.shares;
        position.fee_growth0_entry_x128 = growth0;
        position.fee_growth1_entry_x128 = growth1;
        let manager_address = manager.address();
        self.positions.insert(recipient, position.clone());

        self.lifecycle.record_deposit(
            key,
            manager_address,
            recipient,
            now,
            DepositData {
                amount0,
                amount1,
                duration,
                liquidity: change.liquidity,
                shares: change.shares,
            },
        );
        Ok(position)
    }

    /// Closes `caller`'s position, paying out its slice of the range and the
    /// fees it accrued. Closing before the committed duration is allowed.
    pub fn close(&mut self, caller: Address) -> Result<ClosedPosition, VaultError> {
        let position = self
            .positions
            .get(&caller)
            .cloned()
            .ok_or(VaultError::NoPosition(caller))?;
        if !position.is_open() {
            return Err(VaultError::PositionClosed(caller));
        }
        let now = self.clock.now();
        let key = position.pool;

        let manager = self
            .pools
            .get_mut(&key)
            .ok_or(VaultError::PoolNotRegistered(key))?;

        let mut closed = position.clone();
        closed.status = PositionStatus::Closed;
        self.positions.insert(caller, closed.clone());

        let withdrawal = match manager.redeem_shares(
            position.shares,
            (position.fee_growth0_entry_x128, position.fee_growth1_entry_x128),
            caller,
        ) {
            Ok(withdrawal) => withdrawal,
            Err(err) => {
                self.positions.insert(caller, position);
                return Err(err);
            }
        };
        let manager_address = manager.address();

        let elapsed_secs = closed.elapsed(now);
        let commitment_met = closed.commitment_met(now);
        if !commitment_met {
            debug!(
                owner = ?caller,
                elapsed_secs,
                committed_secs = closed.duration,
                "Position closed before its committed duration"
            );
        }

        self.lifecycle.record_position_closed(
            key,
            manager_address,
            caller,
            now,
            PositionClosedData {
                liquidity_removed: withdrawal.liquidity,
                amount0: withdrawal.amount0,
                amount1: withdrawal.amount1,
                fees0: withdrawal.fees0,
                fees1: withdrawal.fees1,
                elapsed_secs,
                committed_secs: closed.duration,
            },
        );

        Ok(ClosedPosition {
            position: closed,
            withdrawal,
            elapsed_secs,
            commitment_met,
        })
    }

    /// Closes a yield round on the manager for `key`.
    pub fn collect_fees(&mut self, cap: &AdminCap, key: &PoolKey) -> Result<YieldRecord, VaultError> {
        self.authorize(cap)?;
        let manager = self.manager_mut(key)?;
        let record = manager.collect_fees()?;
        let manager_address = manager.address();

        self.lifecycle.record_fees_collected(
            *key,
            manager_address,
            record.timestamp,
            FeesCollectedData {
                round_index: record.round_index,
                fees0: record.fees0,
                fees1: record.fees1,
                liquidity_snapshot: record.liquidity_snapshot,
            },
        );
        Ok(record)
    }

    /// Moves the range of the manager for `key`.
    pub fn redeploy_liquidity(
        &mut self,
        cap: &AdminCap,
        key: &PoolKey,
        new_tick_lower: i32,
        new_tick_upper: i32,
    ) -> Result<Redeployment, VaultError> {
        self.authorize(cap)?;
        let manager = self.manager_mut(key)?;
        let redeployment = manager.redeploy_liquidity(new_tick_lower, new_tick_upper)?;
        let manager_address = manager.address();

        self.lifecycle.record_redeploy(
            *key,
            manager_address,
            self.clock.now(),
            RedeployData {
                old_tick_lower: redeployment.old_tick_lower,
                old_tick_upper: redeployment.old_tick_upper,
                new_tick_lower: redeployment.new_tick_lower,
                new_tick_upper: redeployment.new_tick_upper,
                old_liquidity: redeployment.old_liquidity,
                new_liquidity: redeployment.new_liquidity,
            },
        );
        Ok(redeployment)
    }

    /// Quotes a commitment of `amount0` for `duration` seconds over the
    /// pair's current range, pairing it with token1 of equal value.
    pub fn quote_single(
        &self,
        token0: Address,
        token1: Address,
        amount0: U256,
        duration: u64,
    ) -> Result<SingleQuote, VaultError> {
        let key = self.resolve_pair(token0, token1)?;
        let manager = self
            .pools
            .get(&key)
            .ok_or(VaultError::PoolNotRegistered(key))?;

        let sqrt_price_x96 = manager.pool().slot0().sqrt_price_x96;
        let amount1 = token1_for_token0(amount0, sqrt_price_x96)?;
        let periods = self.config.quote.periods_for(duration);

        let Some(range) = manager.range() else {
            return Ok(SingleQuote {
                amount1,
                quote: Quote::insufficient(0, periods),
                apy: None,
            });
        };
        let quote = manager.quote(amount0, amount1, range.tick_lower, range.tick_upper, periods)?;
        let apy = if quote.is_estimated() {
            annualize(&quote, amount1, sqrt_price_x96, duration)?
        } else {
            None
        };

        debug!(
            pool = %key,
            amount0 = %amount0,
            amount1 = %amount1,
            periods,
            fees0 = %quote.fees0,
            fees1 = %quote.fees1,
            "Quoted deposit"
        );
        Ok(SingleQuote {
            amount1,
            quote,
            apy,
        })
    }
}

/// Moves the deposit into the manager's account and grows its range,
/// returning the tokens if the range cannot take them.
fn fund_range(
    manager: &mut PositionManager,
    spender: Address,
    caller: Address,
    amount0: U256,
    amount1: U256,
) -> Result<LiquidityChange, VaultError> {
    let account = manager.address();
    let token0 = manager.token0().clone();
    let token1 = manager.token1().clone();

    token0.transfer_from(spender, caller, account, amount0)?;
    if let Err(err) = token1.transfer_from(spender, caller, account, amount1) {
        refund(token0.as_ref(), account, caller, amount0);
        return Err(err.into());
    }

    manager.increase_liquidity(amount0, amount1).inspect_err(|_| {
        refund(token0.as_ref(), account, caller, amount0);
        refund(token1.as_ref(), account, caller, amount1);
    })
}

fn refund(token: &dyn TokenClient, from: Address, to: Address, amount: U256) {
    if let Err(err) = token.transfer(from, to, amount) {
        warn!(token = %token.symbol(), to = ?to, amount = %amount, error = %err, "Refund failed");
    }
}

/// Expected fees and the deposit both valued in token1, annualized.
fn annualize(
    quote: &Quote,
    amount1: U256,
    sqrt_price_x96: U256,
    duration: u64,
) -> Result<Option<APY>, VaultError> {
    if duration == 0 {
        return Ok(None);
    }
    let fees = token1_for_token0(quote.fees0, sqrt_price_x96)?.saturating_add(quote.fees1);
    // amount0 is worth amount1 at the current price.
    let principal = amount1.saturating_mul(U256::from(2));

    let (Some(fees), Some(principal)) = (to_decimal(fees), to_decimal(principal)) else {
        return Ok(None);
    };
    if principal.is_zero() {
        return Ok(None);
    }
    Ok(Some(calculate_apy(fees, principal, duration)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::quote::QuoteStatus;
    use rust_decimal_macros::dec;
    use clmm_vault_domain::fees::FeeTier;
    use clmm_vault_domain::math::Q96;
    use clmm_vault_domain::token::Token;
    use clmm_vault_protocols::local::{LocalFactory, LocalPool, LocalToken};
    use clmm_vault_protocols::{ProtocolError, TokenClient};

    const USER: u64 = 20;
    const TRADER: u64 = 21;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn units(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    struct Fixture {
        registry: DepositRegistry,
        cap: AdminCap,
        factory: Arc<LocalFactory>,
        pool: Arc<LocalPool>,
        clock: Arc<ManualClock>,
        key: PoolKey,
    }

    fn fixture() -> Fixture {
        let factory = Arc::new(LocalFactory::new());
        let token_a = Arc::new(LocalToken::new(Token::new(addr(1), "TKA", 18, "Token A")));
        let token_b = Arc::new(LocalToken::new(Token::new(addr(2), "TKB", 18, "Token B")));
        let pool = factory
            .create_pool(addr(100), token_a, token_b, FeeTier::LOW, Q96)
            .unwrap();
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let (registry, cap) =
            DepositRegistry::new(factory.clone(), clock.clone(), VaultConfig::default());
        let key = PoolKey::new(addr(1), addr(2), FeeTier::LOW.fee_pips);

        for account in [addr(USER), addr(TRADER)] {
            pool.local_token0().mint(account, units(1_000_000));
            pool.local_token1().mint(account, units(1_000_000));
        }
        Fixture {
            registry,
            cap,
            factory,
            pool,
            clock,
            key,
        }
    }

    /// Registers the pool, funds the manager one-sided and deploys.
    fn initialised() -> Fixture {
        let mut f = fixture();
        let manager = f.registry.add_pool(&f.cap, addr(1), addr(2), 500).unwrap();
        f.pool.local_token0().mint(manager, units(1000));
        f.pool.local_token1().mint(manager, units(1000));
        f.registry
            .initialise_pool_at_current_price(&f.cap, addr(1), addr(2), units(1000))
            .unwrap();
        f
    }

    fn approve(f: &Fixture, owner: Address) {
        let spender = f.registry.address();
        f.pool.local_token0().approve(owner, spender, U256::MAX).unwrap();
        f.pool.local_token1().approve(owner, spender, U256::MAX).unwrap();
    }

    #[test]
    fn test_add_pool_registers_manager() {
        let Fixture {
            mut registry,
            cap,
            key,
            ..
        } = fixture();

        let manager = registry.add_pool(&cap, addr(1), addr(2), 500).unwrap();

        assert_eq!(registry.manager(&key).unwrap().address(), manager);
        assert_eq!(registry.manager(&key).unwrap().pool_address(), addr(100));
        assert_eq!(registry.manager(&key).unwrap().current_liquidity(), 0);
        assert_eq!(registry.pool_keys(), vec![key]);
        assert_eq!(
            registry.add_pool(&cap, addr(1), addr(2), 500),
            Err(VaultError::PoolExists(key))
        );
    }

    #[test]
    fn test_add_pool_failures() {
        let Fixture {
            mut registry,
            cap,
            factory,
            clock,
            ..
        } = fixture();

        let (_, foreign) = DepositRegistry::new(factory, clock, VaultConfig::default());
        assert_eq!(
            registry.add_pool(&foreign, addr(1), addr(2), 500),
            Err(VaultError::Unauthorized)
        );
        assert_eq!(
            registry.add_pool(&cap, addr(1), addr(2), 3000),
            Err(VaultError::PoolNotFound(PoolKey::new(addr(1), addr(2), 3000)))
        );
        assert!(matches!(
            registry.add_pool(&cap, addr(2), addr(1), 500),
            Err(VaultError::TokenOrderMismatch { .. })
        ));
        assert!(registry.pool_keys().is_empty());
    }

    #[test]
    fn test_initialise_from_manager_balance() {
        let mut f = fixture();
        let manager = f.registry.add_pool(&f.cap, addr(1), addr(2), 500).unwrap();
        f.pool.local_token0().mint(manager, units(1000));
        f.pool.local_token1().mint(manager, units(1000));
        assert_eq!(f.registry.manager(&f.key).unwrap().current_liquidity(), 0);

        let change = f
            .registry
            .initialise_pool_at_current_price(&f.cap, addr(1), addr(2), units(1000))
            .unwrap();

        assert!(change.liquidity > 0);
        assert_eq!(
            f.registry.manager(&f.key).unwrap().current_liquidity(),
            change.liquidity
        );
        assert_eq!(
            f.registry
                .initialise_pool_at_current_price(&f.cap, addr(1), addr(2), units(1)),
            Err(VaultError::AlreadyInitialised(change.liquidity))
        );
    }

    #[test]
    fn test_deposit_records_position() {
        let mut f = initialised();
        approve(&f, addr(USER));
        let before = f.registry.manager(&f.key).unwrap().current_liquidity();

        let position = f
            .registry
            .deposit(addr(USER), addr(1), addr(2), units(100), units(100), addr(USER), 1000)
            .unwrap();

        assert_eq!(position.duration, 1000);
        assert_eq!(position.start_time, 1_700_000_000);
        assert!(position.shares > 0);
        assert_eq!(f.registry.get_position(addr(USER)), Some(&position));
        assert!(f.registry.manager(&f.key).unwrap().current_liquidity() > before);
        assert_eq!(
            f.pool.local_token0().balance_of(addr(USER)),
            units(1_000_000) - units(100)
        );
    }

    #[test]
    fn test_deposit_preconditions() {
        let mut f = initialised();
        approve(&f, addr(USER));

        assert_eq!(
            f.registry
                .deposit(addr(USER), addr(1), addr(2), U256::zero(), units(1), addr(USER), 10),
            Err(VaultError::ZeroAmount)
        );
        assert_eq!(
            f.registry
                .deposit(addr(USER), addr(1), addr(3), units(1), units(1), addr(USER), 10),
            Err(VaultError::PairNotRegistered {
                token0: addr(1),
                token1: addr(3)
            })
        );

        f.registry
            .deposit(addr(USER), addr(1), addr(2), units(1), units(1), addr(USER), 10)
            .unwrap();
        assert_eq!(
            f.registry
                .deposit(addr(USER), addr(1), addr(2), units(1), units(1), addr(USER), 10),
            Err(VaultError::PositionExists(addr(USER)))
        );
    }

    #[test]
    fn test_deposit_before_initialise_fails() {
        let mut f = fixture();
        f.registry.add_pool(&f.cap, addr(1), addr(2), 500).unwrap();
        approve(&f, addr(USER));

        assert_eq!(
            f.registry
                .deposit(addr(USER), addr(1), addr(2), units(1), units(1), addr(USER), 10),
            Err(VaultError::NoActiveRange)
        );
        assert_eq!(f.pool.local_token0().balance_of(addr(USER)), units(1_000_000));
    }

    #[test]
    fn test_failed_pull_refunds_and_records_nothing() {
        let mut f = initialised();
        let spender = f.registry.address();
        // Only token0 is approved, so the token1 pull fails after token0 moved.
        f.pool
            .local_token0()
            .approve(addr(USER), spender, U256::MAX)
            .unwrap();

        let err = f
            .registry
            .deposit(addr(USER), addr(1), addr(2), units(5), units(5), addr(USER), 10)
            .unwrap_err();

        assert!(matches!(
            err,
            VaultError::Protocol(ProtocolError::InsufficientAllowance { .. })
        ));
        assert!(f.registry.get_position(addr(USER)).is_none());
        assert_eq!(f.pool.local_token0().balance_of(addr(USER)), units(1_000_000));
        assert_eq!(f.pool.local_token1().balance_of(addr(USER)), units(1_000_000));
    }

    #[test]
    fn test_close_pays_out_once() {
        let mut f = initialised();
        approve(&f, addr(USER));
        f.registry
            .deposit(addr(USER), addr(1), addr(2), units(100), units(100), addr(USER), 1000)
            .unwrap();
        f.pool.swap(addr(TRADER), true, units(1)).unwrap();
        f.clock.advance(400);

        let balance0 = f.pool.local_token0().balance_of(addr(USER));
        let closed = f.registry.close(addr(USER)).unwrap();

        assert_eq!(closed.position.status, PositionStatus::Closed);
        assert_eq!(closed.elapsed_secs, 400);
        assert!(!closed.commitment_met);
        assert!(closed.withdrawal.fees0 > U256::zero());
        assert!(closed.withdrawal.amount0 > U256::zero());
        assert_eq!(
            f.pool.local_token0().balance_of(addr(USER)),
            balance0 + closed.withdrawal.amount0 + closed.withdrawal.fees0
        );
        assert_eq!(
            f.registry.close(addr(USER)).unwrap_err(),
            VaultError::PositionClosed(addr(USER))
        );
        assert_eq!(
            f.registry.close(addr(99)).unwrap_err(),
            VaultError::NoPosition(addr(99))
        );
    }

    #[test]
    fn test_closed_position_can_be_replaced() {
        let mut f = initialised();
        approve(&f, addr(USER));
        f.registry
            .deposit(addr(USER), addr(1), addr(2), units(10), units(10), addr(USER), 10)
            .unwrap();
        f.registry.close(addr(USER)).unwrap();

        let again = f
            .registry
            .deposit(addr(USER), addr(1), addr(2), units(10), units(10), addr(USER), 20)
            .unwrap();
        assert_eq!(again.duration, 20);
        assert!(again.is_open());
    }

    #[test]
    fn test_maintenance_requires_cap() {
        let mut f = initialised();
        let (_, foreign) =
            DepositRegistry::new(f.factory.clone(), f.clock.clone(), VaultConfig::default());
        let key = f.key;

        assert_eq!(
            f.registry.collect_fees(&foreign, &key),
            Err(VaultError::Unauthorized)
        );
        let record = f.registry.collect_fees(&f.cap, &key).unwrap();
        assert_eq!(record.round_index, 0);

        let moved = f.registry.redeploy_liquidity(&f.cap, &key, -505, 495).unwrap();
        assert!(moved.new_liquidity > 0);
        assert_eq!(f.registry.manager(&key).unwrap().tick_lower(), Some(-505));
    }

    #[test]
    fn test_quote_single() {
        let mut f = initialised();
        let key = f.key;

        let cold = f
            .registry
            .quote_single(addr(1), addr(2), units(10), 30 * 86_400)
            .unwrap();
        assert_eq!(cold.amount1, units(10));
        assert_eq!(cold.quote.status, QuoteStatus::InsufficientHistory);
        assert_eq!(cold.quote.periods, 30);
        assert!(cold.apy.is_none());

        f.pool.swap(addr(TRADER), true, units(50)).unwrap();
        f.registry.collect_fees(&f.cap, &key).unwrap();

        let warm = f
            .registry
            .quote_single(addr(1), addr(2), units(10), 30 * 86_400)
            .unwrap();
        let (_, fees0, _) = warm.amounts();
        assert!(warm.quote.is_estimated());
        assert!(fees0 > U256::zero());
        assert!(warm.apy.unwrap().estimated_annual_return > dec!(0));
    }

    #[test]
    fn test_quote_single_without_range() {
        let mut f = fixture();
        f.registry.add_pool(&f.cap, addr(1), addr(2), 500).unwrap();

        let quote = f
            .registry
            .quote_single(addr(1), addr(2), units(10), 86_400)
            .unwrap();
        assert!(quote.quote.fees0.is_zero());
        assert!(!quote.quote.is_estimated());
    }

    #[test]
    fn test_lifecycle_events() {
        let mut f = initialised();
        approve(&f, addr(USER));
        f.registry
            .deposit(addr(USER), addr(1), addr(2), units(10), units(10), addr(USER), 10)
            .unwrap();
        f.registry.close(addr(USER)).unwrap();

        let lifecycle = f.registry.lifecycle();
        assert_eq!(lifecycle.events_for_pool(&f.key).len(), 4);
        assert_eq!(lifecycle.events_for_owner(addr(USER)).len(), 2);

        let summary = lifecycle.summary(&f.key).unwrap();
        assert!(summary.initialised);
        assert_eq!(summary.deposits, 1);
        assert_eq!(summary.closed_positions, 1);
    }
}
