//! Lifecycle events emitted by the registry.

use clmm_vault_domain::U256;
use clmm_vault_domain::entities::PoolKey;
use clmm_vault_domain::token::Address;
use serde::{Deserialize, Serialize};

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEventType {
    /// A pool was registered with a new manager.
    PoolAdded,
    /// The manager's first range was deployed.
    PoolInitialised,
    /// A depositor opened a position.
    Deposited,
    /// A fee round was recorded.
    FeesCollected,
    /// The range was moved.
    Redeployed,
    /// A depositor closed a position.
    PositionClosed,
}

/// A lifecycle event for a registered pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Event ID.
    pub id: String,
    /// Event type.
    pub event_type: LifecycleEventType,
    /// Registry key of the pool.
    pub pool: PoolKey,
    /// Manager account.
    pub manager: Address,
    /// Depositor, for position events.
    pub owner: Option<Address>,
    /// Timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl LifecycleEvent {
    /// Creates a new lifecycle event at unix time `now`.
    pub fn new(pool: PoolKey, manager: Address, now: u64, data: EventData) -> Self {
        let secs = i64::try_from(now).unwrap_or(i64::MAX);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: data.event_type(),
            pool,
            manager,
            owner: None,
            timestamp: chrono::DateTime::from_timestamp(secs, 0).unwrap_or_default(),
            data,
        }
    }

    /// Sets the depositor the event concerns.
    #[must_use]
    pub fn with_owner(mut self, owner: Address) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Event-specific data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventData {
    /// Pool added data.
    PoolAdded(PoolAddedData),
    /// First deployment data.
    PoolInitialised(LiquidityData),
    /// Deposit data.
    Deposited(DepositData),
    /// Fee round data.
    FeesCollected(FeesCollectedData),
    /// Redeploy data.
    Redeployed(RedeployData),
    /// Close data.
    PositionClosed(PositionClosedData),
}

impl EventData {
    /// Type tag of this payload.
    pub fn event_type(&self) -> LifecycleEventType {
        match self {
            Self::PoolAdded(_) => LifecycleEventType::PoolAdded,
            Self::PoolInitialised(_) => LifecycleEventType::PoolInitialised,
            Self::Deposited(_) => LifecycleEventType::Deposited,
            Self::FeesCollected(_) => LifecycleEventType::FeesCollected,
            Self::Redeployed(_) => LifecycleEventType::Redeployed,
            Self::PositionClosed(_) => LifecycleEventType::PositionClosed,
        }
    }
}

/// Data for pool added event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolAddedData {
    /// Pool contract address.
    pub pool_address: Address,
    /// Manager id.
    pub manager_id: uuid::Uuid,
}

/// Data for a liquidity deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityData {
    /// Lower tick.
    pub tick_lower: i32,
    /// Upper tick.
    pub tick_upper: i32,
    /// Liquidity minted.
    pub liquidity: u128,
    /// Token0 paid.
    pub amount0: U256,
    /// Token1 paid.
    pub amount1: U256,
}

/// Data for deposit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositData {
    /// Token0 deposited.
    pub amount0: U256,
    /// Token1 deposited.
    pub amount1: U256,
    /// Committed duration in seconds.
    pub duration: u64,
    /// Liquidity added to the range.
    pub liquidity: u128,
    /// Shares issued.
    pub shares: u128,
}

/// Data for fees collected event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeesCollectedData {
    /// Round index.
    pub round_index: u64,
    /// Token0 fees.
    pub fees0: U256,
    /// Token1 fees.
    pub fees1: U256,
    /// Liquidity when the round closed.
    pub liquidity_snapshot: u128,
}

/// Data for redeploy event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeployData {
    /// Old lower tick.
    pub old_tick_lower: i32,
    /// Old upper tick.
    pub old_tick_upper: i32,
    /// New lower tick.
    pub new_tick_lower: i32,
    /// New upper tick.
    pub new_tick_upper: i32,
    /// Liquidity before redeploy.
    pub old_liquidity: u128,
    /// Liquidity after redeploy.
    pub new_liquidity: u128,
}

/// Data for position closed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedData {
    /// Liquidity removed from the range.
    pub liquidity_removed: u128,
    /// Principal token0 returned.
    pub amount0: U256,
    /// Principal token1 returned.
    pub amount1: U256,
    /// Fee token0 paid.
    pub fees0: U256,
    /// Fee token1 paid.
    pub fees1: U256,
    /// Seconds the position was open.
    pub elapsed_secs: u64,
    /// Committed duration in seconds.
    pub committed_secs: u64,
}
