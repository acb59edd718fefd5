//! Event-bus adapter between connections and the stores.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use tally_core::ServerKind;
use tally_state::{OrderStore, PortfolioStore};
use tally_telemetry::{LogSink, Metrics};

use crate::event::ServerEvent;
use crate::hub::Subscription;
use crate::registry::{ConnectionRef, ConnectionRegistry, RegistryEvent};

/// Routes connection events into the stores.
#[derive(Clone)]
struct EventRouter {
    portfolios: Arc<PortfolioStore>,
    orders: Arc<OrderStore>,
    log: LogSink,
}

impl EventRouter {
    fn route(&self, connection_id: &str, event: &ServerEvent) {
        Metrics::event_received(event.kind());

        // A panic here would unwind into the connection's thread.
        let result = catch_unwind(AssertUnwindSafe(|| self.apply(connection_id, event)));
        if result.is_err() {
            self.log.error(format!(
                "Failed to apply {} event from {connection_id}",
                event.kind()
            ));
        }
    }

    fn apply(&self, connection_id: &str, event: &ServerEvent) {
        match event {
            ServerEvent::PortfoliosChanged(batch) => {
                let received = batch.len();
                let merged = self.portfolios.merge(batch.clone());
                if merged < received {
                    self.log.warning(format!(
                        "{} of {received} portfolio records from {connection_id} had no account number",
                        received - merged
                    ));
                }
            }
            ServerEvent::OrderIncoming(order) => {
                let outcome = self.orders.upsert(order.clone());
                trace!(
                    connection = connection_id,
                    number_user = order.number_user,
                    ?outcome,
                    "Order event applied"
                );
            }
            ServerEvent::TradeExecuted(trade) => {
                if let Some(order) = self.orders.remove_on_trade(trade) {
                    trace!(
                        connection = connection_id,
                        number_user = order.number_user,
                        number_trade = %trade.number_trade,
                        "Order retired by trade"
                    );
                }
            }
        }
    }
}

/// Subscribes to connections and feeds their events into the stores.
///
/// Holds one subscription per connection id. Attaching an already attached
/// connection revokes the old handler before subscribing again, so repeated
/// registration never produces duplicate handlers.
pub struct StateFeed {
    router: EventRouter,
    subscriptions: Mutex<HashMap<String, Subscription>>,
}

impl StateFeed {
    pub fn new(portfolios: Arc<PortfolioStore>, orders: Arc<OrderStore>, log: LogSink) -> Self {
        Self {
            router: EventRouter {
                portfolios,
                orders,
                log,
            },
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to one connection. Optimizer connections are skipped.
    ///
    /// Returns true if the connection is now attached.
    pub fn attach(&self, connection: &ConnectionRef) -> bool {
        if connection.kind() == ServerKind::Optimizer {
            debug!(id = connection.id(), "Optimizer connection not attached");
            return false;
        }

        let id = connection.id().to_string();
        let mut subscriptions = self.subscriptions.lock();

        // Revoke first: the old handler must be gone before the new one exists.
        if let Some(previous) = subscriptions.remove(&id) {
            previous.cancel();
        }

        let router = self.router.clone();
        let handler_id = id.clone();
        let subscription = connection
            .events()
            .subscribe(Arc::new(move |event: &ServerEvent| {
                router.route(&handler_id, event)
            }));
        subscriptions.insert(id.clone(), subscription);

        debug!(id = %id, kind = %connection.kind(), "Connection attached");
        true
    }

    /// Re-attach every connection in the registry.
    pub fn attach_all(&self, registry: &ConnectionRegistry) -> usize {
        let mut attached = 0;
        for connection in registry.connections() {
            if self.attach(&connection) {
                attached += 1;
            }
        }
        attached
    }

    /// Revoke the subscription for one connection.
    pub fn detach(&self, id: &str) -> bool {
        match self.subscriptions.lock().remove(id) {
            Some(subscription) => {
                subscription.cancel();
                debug!(id, "Connection detached");
                true
            }
            None => false,
        }
    }

    /// Revoke every subscription (shutdown teardown).
    pub fn detach_all(&self) {
        let drained: Vec<Subscription> = self
            .subscriptions
            .lock()
            .drain()
            .map(|(_, sub)| sub)
            .collect();
        debug!(count = drained.len(), "Detaching all connections");
        drop(drained);
    }

    pub fn attached_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn is_attached(&self, id: &str) -> bool {
        self.subscriptions.lock().contains_key(id)
    }

    /// Attach current connections and every connection added later, and
    /// detach connections as they are unregistered.
    ///
    /// Each addition re-attaches all registered connections. The returned
    /// handle stops the watching when dropped.
    #[must_use = "dropping the subscription stops watching the registry"]
    pub fn watch_registry(
        self: &Arc<Self>,
        registry: &Arc<ConnectionRegistry>,
    ) -> Subscription {
        self.attach_all(registry);

        let feed: Weak<StateFeed> = Arc::downgrade(self);
        let weak_registry: Weak<ConnectionRegistry> = Arc::downgrade(registry);
        registry.on_change(Arc::new(move |event: &RegistryEvent| {
            let Some(feed) = feed.upgrade() else {
                return;
            };
            match event {
                RegistryEvent::Added(_) => {
                    if let Some(registry) = weak_registry.upgrade() {
                        feed.attach_all(&registry);
                    }
                }
                RegistryEvent::Removed(connection) => {
                    feed.detach(connection.id());
                }
            }
        }))
    }
}

impl std::fmt::Debug for StateFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<String> = self.subscriptions.lock().keys().cloned().collect();
        ids.sort();
        f.debug_struct("StateFeed").field("attached", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::StubConnection;
    use crate::TradingConnection;
    use rust_decimal_macros::dec;
    use tally_core::{Order, OrderState, Portfolio, Side, Trade, Volume};
    use tally_telemetry::LogMessage;

    fn feed() -> (Arc<StateFeed>, Arc<PortfolioStore>, Arc<OrderStore>) {
        let portfolios = Arc::new(PortfolioStore::new());
        let orders = Arc::new(OrderStore::new());
        let feed = Arc::new(StateFeed::new(
            portfolios.clone(),
            orders.clone(),
            LogSink::new("feed-test").with_fallback(Arc::new(|_: &LogMessage| {})),
        ));
        (feed, portfolios, orders)
    }

    fn active_order(number_user: u64, number_market: &str) -> Order {
        Order {
            number_user,
            number_market: number_market.to_string(),
            portfolio: "A1".to_string(),
            side: Side::Sell,
            volume: Volume::new(dec!(3)),
            state: OrderState::Active,
            server: ServerKind::Quik,
            ..Order::default()
        }
    }

    #[test]
    fn test_events_reach_stores() {
        let (feed, portfolios, orders) = feed();
        let quik = StubConnection::new("quik-1", ServerKind::Quik);
        let conn: ConnectionRef = quik.clone();
        assert!(feed.attach(&conn));

        quik.fire(ServerEvent::PortfoliosChanged(vec![Portfolio::new("A1")]));
        quik.fire(ServerEvent::OrderIncoming(active_order(1, "M1")));

        assert!(portfolios.contains("A1"));
        assert_eq!(orders.snapshot().len(), 1);

        quik.fire(ServerEvent::TradeExecuted(Trade::for_order(
            "M1",
            ServerKind::Quik,
        )));
        assert!(orders.is_empty());
    }

    #[test]
    fn test_reattach_does_not_duplicate_handlers() {
        let (feed, _portfolios, _orders) = feed();
        let quik = StubConnection::new("quik-1", ServerKind::Quik);
        let conn: ConnectionRef = quik.clone();

        feed.attach(&conn);
        feed.attach(&conn);
        feed.attach(&conn);

        assert_eq!(quik.events().handler_count(), 1);
        assert_eq!(feed.attached_count(), 1);
        assert_eq!(
            quik.fire(ServerEvent::OrderIncoming(active_order(1, "M1"))),
            1
        );
    }

    #[test]
    fn test_optimizer_is_not_attached() {
        let (feed, _portfolios, _orders) = feed();
        let optimizer = StubConnection::new("opt", ServerKind::Optimizer);
        let conn: ConnectionRef = optimizer.clone();

        assert!(!feed.attach(&conn));
        assert_eq!(optimizer.events().handler_count(), 0);
    }

    #[test]
    fn test_detach() {
        let (feed, _portfolios, orders) = feed();
        let quik = StubConnection::new("quik-1", ServerKind::Quik);
        let conn: ConnectionRef = quik.clone();
        feed.attach(&conn);

        assert!(feed.detach("quik-1"));
        assert!(!feed.detach("quik-1"));

        quik.fire(ServerEvent::OrderIncoming(active_order(1, "M1")));
        assert!(orders.is_empty());
    }

    #[test]
    fn test_watch_registry_attaches_new_connections_once() {
        let (feed, _portfolios, orders) = feed();
        let registry = Arc::new(ConnectionRegistry::new());
        let first = StubConnection::new("quik-1", ServerKind::Quik);
        registry.add(first.clone()).unwrap();

        let _watch = feed.watch_registry(&registry);
        assert!(feed.is_attached("quik-1"));

        let second = StubConnection::new("plaza-1", ServerKind::Plaza);
        registry.add(second.clone()).unwrap();

        assert!(feed.is_attached("plaza-1"));
        // Re-attaching everything on each addition must not stack handlers.
        assert_eq!(first.events().handler_count(), 1);
        assert_eq!(second.events().handler_count(), 1);

        let mut order = active_order(9, "M9");
        order.server = ServerKind::Plaza;
        second.fire(ServerEvent::OrderIncoming(order));
        assert_eq!(orders.len(), 1);
    }

    #[test]
    fn test_unregistered_connection_is_detached() {
        let (feed, _portfolios, orders) = feed();
        let registry = Arc::new(ConnectionRegistry::new());
        let quik = StubConnection::new("quik-1", ServerKind::Quik);
        registry.add(quik.clone()).unwrap();
        let _watch = feed.watch_registry(&registry);
        assert!(feed.is_attached("quik-1"));

        registry.remove("quik-1");

        assert!(!feed.is_attached("quik-1"));
        assert_eq!(quik.events().handler_count(), 0);
        assert_eq!(quik.fire(ServerEvent::OrderIncoming(active_order(1, "M1"))), 0);
        assert!(orders.is_empty());
    }

    #[test]
    fn test_detach_all() {
        let (feed, _portfolios, _orders) = feed();
        let a = StubConnection::new("a", ServerKind::Quik);
        let b = StubConnection::new("b", ServerKind::Plaza);
        let (ca, cb): (ConnectionRef, ConnectionRef) = (a.clone(), b.clone());
        feed.attach(&ca);
        feed.attach(&cb);

        feed.detach_all();

        assert_eq!(feed.attached_count(), 0);
        assert_eq!(a.events().handler_count(), 0);
        assert_eq!(b.events().handler_count(), 0);
    }

    #[test]
    fn test_simulated_events_do_not_dirty_stores() {
        let (feed, _portfolios, orders) = feed();
        let tester = StubConnection::new("tester", ServerKind::Tester);
        let conn: ConnectionRef = tester.clone();
        feed.attach(&conn);

        let mut order = active_order(1, "M1");
        order.server = ServerKind::Tester;
        tester.fire(ServerEvent::OrderIncoming(order));

        assert!(orders.is_empty());
        assert!(!orders.dirty().is_set());
    }
}
