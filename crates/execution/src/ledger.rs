//! Append-only record of fee collection rounds.

use clmm_vault_domain::U256;
use clmm_vault_domain::entities::YieldRecord;
use serde::{Deserialize, Serialize};

/// Fee collection history of one position manager.
///
/// Records are indexed by round and never modified after they are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldLedger {
    records: Vec<YieldRecord>,
}

impl YieldLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next round and returns it.
    pub fn record(
        &mut self,
        fees0: U256,
        fees1: U256,
        liquidity_snapshot: u128,
        timestamp: u64,
    ) -> YieldRecord {
        let record = YieldRecord {
            round_index: self.rounds(),
            fees0,
            fees1,
            liquidity_snapshot,
            timestamp,
        };
        self.records.push(record);
        record
    }

    /// Number of completed rounds.
    pub fn rounds(&self) -> u64 {
        self.records.len() as u64
    }

    /// Record of round `round`, or the all-zero record past the last round.
    pub fn yield_history(&self, round: u64) -> YieldRecord {
        usize::try_from(round)
            .ok()
            .and_then(|index| self.records.get(index))
            .copied()
            .unwrap_or_default()
    }

    pub fn records(&self) -> &[YieldRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&YieldRecord> {
        self.records.last()
    }

    /// The most recent `lookback` rounds, or all of them.
    pub fn window(&self, lookback: Option<usize>) -> &[YieldRecord] {
        match lookback {
            Some(n) if n < self.records.len() => &self.records[self.records.len() - n..],
            _ => &self.records,
        }
    }

    /// Fees summed over every round.
    pub fn total_fees(&self) -> (U256, U256) {
        self.records.iter().fold(
            (U256::zero(), U256::zero()),
            |(total0, total1), record| {
                (
                    total0.saturating_add(record.fees0),
                    total1.saturating_add(record.fees1),
                )
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_are_indexed_in_order() {
        let mut ledger = YieldLedger::new();
        let first = ledger.record(U256::from(10), U256::zero(), 500, 100);
        let second = ledger.record(U256::zero(), U256::zero(), 500, 200);

        assert_eq!(first.round_index, 0);
        assert_eq!(second.round_index, 1);
        assert_eq!(ledger.rounds(), 2);
        assert_eq!(ledger.yield_history(0), first);
        assert_eq!(ledger.yield_history(1), second);
    }

    #[test]
    fn test_history_past_last_round_is_zero() {
        let mut ledger = YieldLedger::new();
        assert!(ledger.yield_history(0).is_zero());

        ledger.record(U256::from(1), U256::from(2), 3, 4);
        assert!(ledger.yield_history(1).is_zero());
        assert!(ledger.yield_history(u64::MAX).is_zero());
    }

    #[test]
    fn test_window_and_totals() {
        let mut ledger = YieldLedger::new();
        for i in 1..=5u64 {
            ledger.record(U256::from(i), U256::from(i * 10), 1_000, i);
        }

        assert_eq!(ledger.window(None).len(), 5);
        assert_eq!(ledger.window(Some(10)).len(), 5);
        let recent = ledger.window(Some(2));
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].round_index, 3);

        assert_eq!(ledger.total_fees(), (U256::from(15), U256::from(150)));
    }
}
