//! Trading-server connection contract.

use tally_core::{Order, ServerKind};

use crate::error::BusResult;
use crate::event::ServerEvent;
use crate::hub::EventHub;

/// A connection to a trading server.
///
/// Connections run on their own threads/tasks and fire [`ServerEvent`]s
/// through their hub from there. Implementations must tolerate handlers
/// being added and revoked at any time.
pub trait TradingConnection: Send + Sync {
    /// Unique connection id inside the registry.
    fn id(&self) -> &str;

    /// Venue kind, used to route cancel requests.
    fn kind(&self) -> ServerKind;

    /// Notification stream for portfolio, order and trade events.
    fn events(&self) -> &EventHub<ServerEvent>;

    /// Ask the venue to cancel an order.
    fn cancel_order(&self, order: &Order) -> BusResult<()>;
}
