//! Order store: one record per user number, merged field by field.
//!
//! Orders from simulated connections are never stored. An order leaves the
//! store when a trade arrives for its market number, or on [`OrderStore::clear`].
//! Filled/cancelled orders that never saw a trade stay physically stored but
//! are filtered out of [`OrderStore::snapshot`].

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use tally_core::{Order, OrderState, Trade};
use tally_telemetry::Metrics;

use crate::dirty::DirtyFlag;
use crate::error::StateResult;

/// Result of dispatching a cancel request to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Request handed to the connection.
    Sent,
    /// No live connection of the order's kind; nothing was sent.
    NoConnection,
}

/// Cancel capability keyed by the order's connection kind.
#[cfg_attr(test, mockall::automock)]
pub trait OrderCanceller: Send + Sync {
    fn cancel_order(&self, order: &Order) -> StateResult<CancelOutcome>;
}

/// What [`OrderStore::upsert`] did with an incoming order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Not stored: simulated connection or missing user number.
    Ignored,
    /// First event for this user number.
    Inserted,
    /// Merged into the stored record.
    Updated { changed: bool },
}

/// What [`OrderStore::close_one`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Sent,
    NoConnection,
    /// Order is not pending/active or has no account.
    NotCancellable,
    /// Connection rejected the request (logged).
    Failed,
}

/// Tally of a [`OrderStore::close_all`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseAllReport {
    pub sent: usize,
    pub no_connection: usize,
    pub failed: usize,
}

/// Thread-safe collection of orders in insertion order.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: Mutex<Vec<Order>>,
    dirty: DirtyFlag,
}

impl OrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new order or merge an update into the stored one.
    pub fn upsert(&self, order: Order) -> UpsertOutcome {
        if order.server.is_simulated() {
            trace!(
                number_user = order.number_user,
                server = %order.server,
                "Ignoring order from simulated connection"
            );
            return UpsertOutcome::Ignored;
        }
        if let Err(e) = order.validate() {
            warn!(error = %e, number_market = %order.number_market, "Skipping order record");
            Metrics::record_skipped("order_without_number");
            return UpsertOutcome::Ignored;
        }

        let outcome = {
            let mut orders = self.orders.lock();
            let outcome = match orders
                .iter_mut()
                .find(|o| o.number_user == order.number_user)
            {
                Some(existing) => UpsertOutcome::Updated {
                    changed: existing.merge_from(&order),
                },
                None => {
                    orders.push(order);
                    UpsertOutcome::Inserted
                }
            };
            // Under the lock so concurrent writers publish counts in order.
            Metrics::orders_stored(orders.len());
            outcome
        };

        self.dirty.mark();
        outcome
    }

    /// Retire the order a trade was executed against.
    ///
    /// Matches the first stored order whose market number equals the trade's
    /// parent number. Returns the removed order, or `None` on a miss.
    pub fn remove_on_trade(&self, trade: &Trade) -> Option<Order> {
        if trade.server.is_simulated() {
            return None;
        }
        if let Err(e) = trade.validate() {
            debug!(error = %e, "Trade without parent order, nothing to remove");
            return None;
        }

        let removed = {
            let mut orders = self.orders.lock();
            if orders.is_empty() {
                return None;
            }
            let idx = orders
                .iter()
                .position(|o| o.number_market == trade.number_order_parent)?;
            let removed = orders.remove(idx);
            Metrics::orders_stored(orders.len());
            removed
        };

        trace!(
            number_user = removed.number_user,
            number_market = %removed.number_market,
            "Order removed on trade"
        );
        self.dirty.mark();
        Some(removed)
    }

    /// Working orders, newest first.
    ///
    /// Only pending/active orders with a known side are returned.
    pub fn snapshot(&self) -> Vec<Order> {
        self.orders
            .lock()
            .iter()
            .rev()
            .filter(|o| o.is_visible())
            .cloned()
            .collect()
    }

    /// Every stored order in insertion order, including hidden ones.
    pub fn all(&self) -> Vec<Order> {
        self.orders.lock().clone()
    }

    /// Look up an order by user number.
    pub fn get(&self, number_user: u64) -> Option<Order> {
        self.orders
            .lock()
            .iter()
            .find(|o| o.number_user == number_user)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.lock().is_empty()
    }

    /// Drop every order (account/session reset).
    pub fn clear(&self) {
        {
            let mut orders = self.orders.lock();
            orders.clear();
            Metrics::orders_stored(0);
        }
        self.dirty.mark();
    }

    /// Request cancellation of every active order that has an account.
    ///
    /// The lock is released before any connection is called. A failing
    /// cancel is logged and the sweep continues.
    pub fn close_all(&self, canceller: &dyn OrderCanceller) -> CloseAllReport {
        let targets: Vec<Order> = self
            .orders
            .lock()
            .iter()
            .filter(|o| o.state == OrderState::Active && !o.portfolio.is_empty())
            .cloned()
            .collect();

        let mut report = CloseAllReport::default();
        for order in &targets {
            match canceller.cancel_order(order) {
                Ok(CancelOutcome::Sent) => report.sent += 1,
                Ok(CancelOutcome::NoConnection) => report.no_connection += 1,
                Err(e) => {
                    warn!(
                        number_user = order.number_user,
                        server = %order.server,
                        error = %e,
                        "Cancel request failed"
                    );
                    report.failed += 1;
                }
            }
        }

        debug!(
            sent = report.sent,
            no_connection = report.no_connection,
            failed = report.failed,
            "Close-all sweep finished"
        );
        report
    }

    /// Request cancellation of one order.
    ///
    /// The stored copy is preferred over `order` so that the check runs on
    /// the latest state.
    pub fn close_one(&self, order: &Order, canceller: &dyn OrderCanceller) -> CloseOutcome {
        let current = self.get(order.number_user).unwrap_or_else(|| order.clone());

        if !current.is_cancellable() || current.portfolio.is_empty() {
            return CloseOutcome::NotCancellable;
        }

        match canceller.cancel_order(&current) {
            Ok(CancelOutcome::Sent) => CloseOutcome::Sent,
            Ok(CancelOutcome::NoConnection) => CloseOutcome::NoConnection,
            Err(e) => {
                warn!(
                    number_user = current.number_user,
                    server = %current.server,
                    error = %e,
                    "Cancel request failed"
                );
                CloseOutcome::Failed
            }
        }
    }

    /// Request cancellation of the order with this user number.
    ///
    /// Returns `None` if no such order is stored.
    pub fn close_by_user_number(
        &self,
        number_user: u64,
        canceller: &dyn OrderCanceller,
    ) -> Option<CloseOutcome> {
        let order = self.get(number_user)?;
        Some(self.close_one(&order, canceller))
    }

    /// Change flag consumed by the refresh loop.
    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }
}
