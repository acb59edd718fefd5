//! Registry of live trading-server connections.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use tally_core::{Order, ServerKind};
use tally_state::{CancelOutcome, OrderCanceller, StateError, StateResult};
use tally_telemetry::Metrics;

use crate::connection::TradingConnection;
use crate::error::{BusError, BusResult};
use crate::hub::{EventHub, Subscription};

/// Shared connection handle.
pub type ConnectionRef = Arc<dyn TradingConnection>;

/// Change to the set of registered connections.
#[derive(Clone)]
pub enum RegistryEvent {
    Added(ConnectionRef),
    Removed(ConnectionRef),
}

impl RegistryEvent {
    pub fn connection(&self) -> &ConnectionRef {
        match self {
            Self::Added(connection) | Self::Removed(connection) => connection,
        }
    }
}

impl fmt::Debug for RegistryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Added(_) => "Added",
            Self::Removed(_) => "Removed",
        };
        f.debug_tuple(name).field(&self.connection().id()).finish()
    }
}

/// All connections deployed in the process.
///
/// Announces additions and removals through [`on_change`] and routes cancel
/// requests to the first connection of the order's kind.
///
/// [`on_change`]: Self::on_change
pub struct ConnectionRegistry {
    connections: RwLock<Vec<ConnectionRef>>,
    changes: EventHub<RegistryEvent>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(Vec::new()),
            changes: EventHub::new(),
        }
    }

    /// Register a connection and notify watchers.
    pub fn add(&self, connection: ConnectionRef) -> BusResult<()> {
        {
            let mut connections = self.connections.write();
            if connections.iter().any(|c| c.id() == connection.id()) {
                return Err(BusError::DuplicateConnection(connection.id().to_string()));
            }
            connections.push(connection.clone());
        }

        info!(id = connection.id(), kind = %connection.kind(), "Connection registered");
        self.changes.emit(&RegistryEvent::Added(connection));
        Ok(())
    }

    /// Unregister a connection by id and notify watchers.
    pub fn remove(&self, id: &str) -> Option<ConnectionRef> {
        let removed = {
            let mut connections = self.connections.write();
            let idx = connections.iter().position(|c| c.id() == id)?;
            connections.remove(idx)
        };

        debug!(id, "Connection unregistered");
        self.changes.emit(&RegistryEvent::Removed(removed.clone()));
        Some(removed)
    }

    /// Current connections in registration order.
    pub fn connections(&self) -> Vec<ConnectionRef> {
        self.connections.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<ConnectionRef> {
        self.connections.read().iter().find(|c| c.id() == id).cloned()
    }

    /// First registered connection of a kind.
    pub fn find_by_kind(&self, kind: ServerKind) -> Option<ConnectionRef> {
        self.connections
            .read()
            .iter()
            .find(|c| c.kind() == kind)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Watch connections being registered and unregistered.
    ///
    /// Handlers run after the registry lock is released.
    #[must_use = "dropping the subscription stops the notifications"]
    pub fn on_change(
        &self,
        handler: Arc<dyn Fn(&RegistryEvent) + Send + Sync>,
    ) -> Subscription {
        self.changes.subscribe(handler)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self
            .connections
            .read()
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        f.debug_struct("ConnectionRegistry")
            .field("connections", &ids)
            .finish()
    }
}

impl OrderCanceller for ConnectionRegistry {
    /// Missing connection for the order's kind is a silent no-op.
    fn cancel_order(&self, order: &Order) -> StateResult<CancelOutcome> {
        let Some(connection) = self.find_by_kind(order.server) else {
            debug!(
                number_user = order.number_user,
                kind = %order.server,
                "No connection for cancel request"
            );
            Metrics::cancel_request("no_connection");
            return Ok(CancelOutcome::NoConnection);
        };

        match connection.cancel_order(order) {
            Ok(()) => {
                Metrics::cancel_request("sent");
                Ok(CancelOutcome::Sent)
            }
            Err(e) => {
                Metrics::cancel_request("failed");
                Err(StateError::Cancel {
                    number_user: order.number_user,
                    reason: e.to_string(),
                })
            }
        }
    }
}
