//! Portfolio store: one record per account number, last full update wins.

use parking_lot::Mutex;
use tracing::{trace, warn};

use tally_core::Portfolio;
use tally_telemetry::Metrics;

use crate::dirty::DirtyFlag;

/// Thread-safe collection of portfolio snapshots keyed by account number.
///
/// A merge replaces the whole previous record for a key; there is no
/// field-level patching. Records are only removed by [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct PortfolioStore {
    portfolios: Mutex<Vec<Portfolio>>,
    dirty: DirtyFlag,
}

impl PortfolioStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of portfolios reported by a connection.
    ///
    /// The whole batch is applied under one lock. Records without an account
    /// number are skipped and the rest of the batch continues. Returns the
    /// number of records merged; the dirty flag is raised when it is non-zero.
    pub fn merge(&self, incoming: Vec<Portfolio>) -> usize {
        if incoming.is_empty() {
            return 0;
        }

        let merged = {
            let mut portfolios = self.portfolios.lock();
            let mut merged = 0;

            for portfolio in incoming {
                if let Err(e) = portfolio.validate() {
                    warn!(error = %e, "Skipping portfolio record");
                    Metrics::record_skipped("portfolio_without_number");
                    continue;
                }

                if let Some(idx) = portfolios.iter().position(|p| p.number == portfolio.number) {
                    portfolios.remove(idx);
                }
                trace!(account = %portfolio.number, "Portfolio merged");
                portfolios.push(portfolio);
                merged += 1;
            }

            if merged > 0 {
                Metrics::portfolios_stored(portfolios.len());
            }
            merged
        };

        if merged > 0 {
            self.dirty.mark();
        }
        merged
    }

    /// Copy of the current records, in merge order.
    pub fn snapshot(&self) -> Vec<Portfolio> {
        self.portfolios.lock().clone()
    }

    /// Look up one account.
    pub fn get(&self, number: &str) -> Option<Portfolio> {
        self.portfolios
            .lock()
            .iter()
            .find(|p| p.number == number)
            .cloned()
    }

    /// Returns true if an account with this number is stored.
    pub fn contains(&self, number: &str) -> bool {
        self.portfolios.lock().iter().any(|p| p.number == number)
    }

    pub fn len(&self) -> usize {
        self.portfolios.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.portfolios.lock().is_empty()
    }

    /// Drop every record (account/session reset).
    pub fn clear(&self) {
        {
            let mut portfolios = self.portfolios.lock();
            portfolios.clear();
            Metrics::portfolios_stored(0);
        }
        self.dirty.mark();
    }

    /// Change flag consumed by the refresh loop.
    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::{PositionOnBoard, Volume};

    fn portfolio(number: &str, current: rust_decimal::Decimal) -> Portfolio {
        Portfolio {
            number: number.to_string(),
            value_begin: dec!(1000),
            value_current: current,
            ..Portfolio::default()
        }
    }

    #[test]
    fn test_last_merge_wins() {
        let store = PortfolioStore::new();

        store.merge(vec![portfolio("A1", dec!(1000))]);
        store.merge(vec![portfolio("A1", dec!(900))]);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].value_current, dec!(900));
    }

    #[test]
    fn test_merge_replaces_whole_record() {
        let store = PortfolioStore::new();
        let mut with_positions = portfolio("A1", dec!(1000));
        with_positions.positions = Some(vec![PositionOnBoard {
            security: "SBER".to_string(),
            value_current: Volume::new(dec!(10)),
            ..PositionOnBoard::default()
        }]);

        store.merge(vec![with_positions]);
        store.merge(vec![portfolio("A1", dec!(1000))]);

        let stored = store.get("A1").unwrap();
        assert!(stored.positions.is_none());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = PortfolioStore::new();
        let twice = PortfolioStore::new();
        let batch = vec![portfolio("A1", dec!(1000)), portfolio("A2", dec!(500))];

        once.merge(batch.clone());
        twice.merge(batch.clone());
        twice.merge(batch);

        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn test_record_without_number_is_skipped() {
        let store = PortfolioStore::new();

        let merged = store.merge(vec![
            portfolio("A1", dec!(1000)),
            portfolio("", dec!(1)),
            portfolio("A2", dec!(500)),
        ]);

        assert_eq!(merged, 2);
        assert_eq!(store.len(), 2);
        assert!(store.contains("A1"));
        assert!(store.contains("A2"));
    }

    #[test]
    fn test_dirty_flag() {
        let store = PortfolioStore::new();

        assert_eq!(store.merge(Vec::new()), 0);
        assert!(!store.dirty().is_set());

        store.merge(vec![portfolio("", dec!(1))]);
        assert!(!store.dirty().is_set());

        store.merge(vec![portfolio("A1", dec!(1))]);
        assert!(store.dirty().take());
    }

    #[test]
    fn test_clear() {
        let store = PortfolioStore::new();
        store.merge(vec![portfolio("A1", dec!(1))]);
        store.dirty().clear();

        store.clear();

        assert!(store.is_empty());
        assert!(store.dirty().is_set());
    }

    #[test]
    fn test_concurrent_merges_keep_one_record_per_account() {
        use std::sync::Arc;

        let store = Arc::new(PortfolioStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let number = format!("A{}", i % 10);
                        store.merge(vec![portfolio(&number, rust_decimal::Decimal::from(t))]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 10);
    }
}
