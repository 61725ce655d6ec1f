//! Simulation events for tracking what happens during a swap run.
//!
//! Every attempted trade is logged, whether the pool filled it or rejected it,
//! so a run can be inspected after the fact.

use clmm_vault_domain::U256;
use serde::{Deserialize, Serialize};

/// Types of events that can occur during simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEventType {
    /// Pool filled a trade.
    Swap,
    /// Pool refused a trade.
    SwapRejected,
}

/// A simulation event with full context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Step number when the event occurred.
    pub step: u64,
    /// Type of event.
    pub event_type: SimulationEventType,
    /// Trade direction.
    pub zero_for_one: bool,
    /// Amount offered by the trader.
    pub amount_in: U256,
    /// Tick after the event.
    pub tick: i32,
    /// Additional event-specific data.
    pub data: EventData,
}

/// Event-specific data payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventData {
    /// Filled trade.
    Filled {
        /// Input consumed, fee included.
        consumed: U256,
        /// Output paid to the trader.
        amount_out: U256,
        /// Fee charged.
        fee: U256,
    },
    /// Refused trade.
    Rejected {
        /// Reason given by the pool.
        reason: String,
    },
}

impl SimulationEvent {
    /// Creates a filled-swap event.
    #[must_use]
    pub fn swap(
        step: u64,
        zero_for_one: bool,
        amount_in: U256,
        tick: i32,
        consumed: U256,
        amount_out: U256,
        fee: U256,
    ) -> Self {
        Self {
            step,
            event_type: SimulationEventType::Swap,
            zero_for_one,
            amount_in,
            tick,
            data: EventData::Filled {
                consumed,
                amount_out,
                fee,
            },
        }
    }

    /// Creates a rejected-swap event.
    #[must_use]
    pub fn rejected(step: u64, zero_for_one: bool, amount_in: U256, tick: i32, reason: String) -> Self {
        Self {
            step,
            event_type: SimulationEventType::SwapRejected,
            zero_for_one,
            amount_in,
            tick,
            data: EventData::Rejected { reason },
        }
    }

    /// Fee charged, zero for rejected trades.
    pub fn fee(&self) -> U256 {
        match &self.data {
            EventData::Filled { fee, .. } => *fee,
            EventData::Rejected { .. } => U256::zero(),
        }
    }
}

/// Log of simulation events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SimulationEvent>,
}

impl EventLog {
    /// Creates a new empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event.
    pub fn record(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    /// Returns all events.
    #[must_use]
    pub fn events(&self) -> &[SimulationEvent] {
        &self.events
    }

    /// Returns events of a specific type.
    #[must_use]
    pub fn events_of_type(&self, event_type: SimulationEventType) -> Vec<&SimulationEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Counts events of a specific type.
    #[must_use]
    pub fn count_by_type(&self, event_type: SimulationEventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    /// Clears all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
