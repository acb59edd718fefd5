//! Notifications fired by trading-server connections.

use serde::{Deserialize, Serialize};

use tally_core::{Order, Portfolio, Trade};

/// One notification from a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// One or more account portfolios changed (full records).
    PortfoliosChanged(Vec<Portfolio>),
    /// New order or partial update of a known order.
    OrderIncoming(Order),
    /// One of our orders was executed.
    TradeExecuted(Trade),
}

impl ServerEvent {
    /// Metric/log label for the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PortfoliosChanged(_) => "portfolios",
            Self::OrderIncoming(_) => "order",
            Self::TradeExecuted(_) => "trade",
        }
    }
}
