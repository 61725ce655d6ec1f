//! Lifecycle tracker for registry history.

use super::{
    DepositData, EventData, FeesCollectedData, LifecycleEvent, LiquidityData, PoolAddedData,
    PositionClosedData, RedeployData,
};
use clmm_vault_domain::U256;
use clmm_vault_domain::entities::PoolKey;
use clmm_vault_domain::token::Address;
use std::collections::HashMap;
use tracing::info;

/// Summary of one registered pool's activity.
#[derive(Debug, Clone)]
pub struct PoolSummary {
    /// Registry key.
    pub pool: PoolKey,
    /// Manager account.
    pub manager: Address,
    /// When the pool was registered.
    pub added_at: chrono::DateTime<chrono::Utc>,
    /// Whether the first range was deployed.
    pub initialised: bool,
    /// Deposits accepted.
    pub deposits: u32,
    /// Positions currently open.
    pub open_positions: u32,
    /// Positions closed.
    pub closed_positions: u32,
    /// Fee rounds recorded.
    pub rounds: u64,
    /// Token0 fees over all rounds.
    pub total_fees0: U256,
    /// Token1 fees over all rounds.
    pub total_fees1: U256,
    /// Number of redeploys.
    pub redeploy_count: u32,
}

/// Tracks lifecycle events for all registered pools.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    /// Events in emission order.
    events: Vec<LifecycleEvent>,
    /// Pool summaries.
    summaries: HashMap<PoolKey, PoolSummary>,
}

impl LifecycleTracker {
    /// Creates a new lifecycle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pool registration.
    pub fn record_pool_added(
        &mut self,
        pool: PoolKey,
        manager: Address,
        now: u64,
        data: PoolAddedData,
    ) {
        let event = LifecycleEvent::new(pool, manager, now, EventData::PoolAdded(data.clone()));

        self.summaries.insert(
            pool,
            PoolSummary {
                pool,
                manager,
                added_at: event.timestamp,
                initialised: false,
                deposits: 0,
                open_positions: 0,
                closed_positions: 0,
                rounds: 0,
                total_fees0: U256::zero(),
                total_fees1: U256::zero(),
                redeploy_count: 0,
            },
        );
        self.events.push(event);

        info!(
            pool = %pool,
            manager = ?manager,
            pool_address = ?data.pool_address,
            "Pool added"
        );
    }

    /// Records the first range deployment.
    pub fn record_pool_initialised(
        &mut self,
        pool: PoolKey,
        manager: Address,
        now: u64,
        data: LiquidityData,
    ) {
        if let Some(summary) = self.summaries.get_mut(&pool) {
            summary.initialised = true;
        }

        info!(
            pool = %pool,
            tick_lower = data.tick_lower,
            tick_upper = data.tick_upper,
            liquidity = data.liquidity,
            "Pool initialised"
        );
        self.events.push(LifecycleEvent::new(
            pool,
            manager,
            now,
            EventData::PoolInitialised(data),
        ));
    }

    /// Records a deposit.
    pub fn record_deposit(
        &mut self,
        pool: PoolKey,
        manager: Address,
        owner: Address,
        now: u64,
        data: DepositData,
    ) {
        if let Some(summary) = self.summaries.get_mut(&pool) {
            summary.deposits += 1;
            summary.open_positions += 1;
        }

        info!(
            pool = %pool,
            owner = ?owner,
            amount0 = %data.amount0,
            amount1 = %data.amount1,
            duration = data.duration,
            shares = data.shares,
            "Deposit accepted"
        );
        self.events.push(
            LifecycleEvent::new(pool, manager, now, EventData::Deposited(data)).with_owner(owner),
        );
    }

    /// Records a fee round.
    pub fn record_fees_collected(
        &mut self,
        pool: PoolKey,
        manager: Address,
        now: u64,
        data: FeesCollectedData,
    ) {
        if let Some(summary) = self.summaries.get_mut(&pool) {
            summary.rounds += 1;
            summary.total_fees0 = summary.total_fees0.saturating_add(data.fees0);
            summary.total_fees1 = summary.total_fees1.saturating_add(data.fees1);
        }

        info!(
            pool = %pool,
            round = data.round_index,
            fees0 = %data.fees0,
            fees1 = %data.fees1,
            "Fee round recorded"
        );
        self.events.push(LifecycleEvent::new(
            pool,
            manager,
            now,
            EventData::FeesCollected(data),
        ));
    }

    /// Records a redeploy.
    pub fn record_redeploy(
        &mut self,
        pool: PoolKey,
        manager: Address,
        now: u64,
        data: RedeployData,
    ) {
        if let Some(summary) = self.summaries.get_mut(&pool) {
            summary.redeploy_count += 1;
        }

        info!(
            pool = %pool,
            old_range = format!("[{}, {})", data.old_tick_lower, data.old_tick_upper),
            new_range = format!("[{}, {})", data.new_tick_lower, data.new_tick_upper),
            "Range redeployed"
        );
        self.events.push(LifecycleEvent::new(
            pool,
            manager,
            now,
            EventData::Redeployed(data),
        ));
    }

    /// Records a position close.
    pub fn record_position_closed(
        &mut self,
        pool: PoolKey,
        manager: Address,
        owner: Address,
        now: u64,
        data: PositionClosedData,
    ) {
        if let Some(summary) = self.summaries.get_mut(&pool) {
            summary.open_positions = summary.open_positions.saturating_sub(1);
            summary.closed_positions += 1;
        }

        info!(
            pool = %pool,
            owner = ?owner,
            fees0 = %data.fees0,
            fees1 = %data.fees1,
            elapsed_secs = data.elapsed_secs,
            committed_secs = data.committed_secs,
            "Position closed"
        );
        self.events.push(
            LifecycleEvent::new(pool, manager, now, EventData::PositionClosed(data))
                .with_owner(owner),
        );
    }

    /// All events in emission order.
    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    /// Events of one pool.
    pub fn events_for_pool(&self, pool: &PoolKey) -> Vec<&LifecycleEvent> {
        self.events.iter().filter(|e| e.pool == *pool).collect()
    }

    /// Events concerning one depositor.
    pub fn events_for_owner(&self, owner: Address) -> Vec<&LifecycleEvent> {
        self.events
            .iter()
            .filter(|e| e.owner == Some(owner))
            .collect()
    }

    /// Gets the summary for a pool.
    pub fn summary(&self, pool: &PoolKey) -> Option<&PoolSummary> {
        self.summaries.get(pool)
    }

    /// Gets all pool summaries.
    pub fn all_summaries(&self) -> Vec<&PoolSummary> {
        self.summaries.values().collect()
    }

    /// Gets aggregate statistics.
    pub fn aggregate_stats(&self) -> AggregateStats {
        let mut stats = AggregateStats::default();

        for summary in self.summaries.values() {
            stats.pools += 1;
            if summary.initialised {
                stats.initialised_pools += 1;
            }
            stats.open_positions += summary.open_positions;
            stats.closed_positions += summary.closed_positions;
            stats.rounds += summary.rounds;
            stats.redeploys += summary.redeploy_count;
        }

        stats
    }
}

/// Aggregate statistics across all pools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Registered pools.
    pub pools: u32,
    /// Pools with a deployed range.
    pub initialised_pools: u32,
    /// Open positions.
    pub open_positions: u32,
    /// Closed positions.
    pub closed_positions: u32,
    /// Fee rounds recorded.
    pub rounds: u64,
    /// Redeploys performed.
    pub redeploys: u32,
}
