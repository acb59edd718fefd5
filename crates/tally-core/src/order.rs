//! Order records and the partial-update merge rule.
//!
//! Connections report orders piecemeal: the first event usually carries only
//! the user number and request, the market number and state arrive later.
//! [`Order::merge_from`] folds such partial updates into the stored record.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Price, Volume};
use crate::error::{CoreError, Result};
use crate::server::ServerKind;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Side not reported yet.
    #[default]
    None,
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// State not reported yet.
    #[default]
    None,
    /// Sent, not yet acknowledged by the venue.
    Pending,
    /// Working on the venue.
    Active,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    /// Connection dropped while the order was working.
    LostConnection,
}

impl OrderState {
    /// Returns true if the venue will not change this order anymore.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::PartiallyFilled => "partially_filled",
            Self::Filled => "filled",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
            Self::LostConnection => "lost_connection",
        };
        f.write_str(name)
    }
}

/// Order price type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
    Iceberg,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::Market => write!(f, "market"),
            Self::Iceberg => write!(f, "iceberg"),
        }
    }
}

/// A trading order as reported by a connection.
///
/// Every field except `number_user` may be missing (default) in a given event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    /// User-assigned number (store key, never reused).
    pub number_user: u64,
    /// Venue-assigned number. Empty until the venue acknowledges the order.
    pub number_market: String,
    /// Instrument code.
    pub security: String,
    /// Account number the order trades on.
    pub portfolio: String,
    pub side: Side,
    /// Requested volume.
    pub volume: Volume,
    /// Volume executed so far.
    pub volume_executed: Volume,
    /// Limit (requested) price.
    pub price: Price,
    /// Average realized price.
    pub price_real: Price,
    pub state: OrderState,
    pub order_type: OrderType,
    /// Creation time on our side.
    pub time_create: Option<DateTime<Utc>>,
    /// Time of the first venue callback.
    pub time_callback: Option<DateTime<Utc>>,
    /// Send-to-acknowledge latency.
    pub time_round_trip: Duration,
    /// Connection kind the order was routed through.
    pub server: ServerKind,
}

impl Order {
    /// Create an order skeleton with just its user number and connection kind.
    #[must_use]
    pub fn new(number_user: u64, server: ServerKind) -> Self {
        Self {
            number_user,
            server,
            ..Self::default()
        }
    }

    /// Check the record can be keyed.
    pub fn validate(&self) -> Result<()> {
        if self.number_user == 0 {
            return Err(CoreError::MissingUserNumber);
        }
        Ok(())
    }

    /// Returns true if the order belongs on the working-orders view.
    ///
    /// Only pending or active orders with a known side are shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        matches!(self.state, OrderState::Pending | OrderState::Active) && self.side != Side::None
    }

    /// Returns true if a cancel request makes sense for this order.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        matches!(self.state, OrderState::Pending | OrderState::Active)
    }

    /// Fold a partial update into this record.
    ///
    /// A field is overwritten only when the update carries a non-default
    /// value for it, so a zero/empty field in `update` never clears what is
    /// already stored. Instrument code and callback time are filled once and
    /// then kept. Returns true if any field changed.
    pub fn merge_from(&mut self, update: &Order) -> bool {
        let before = self.clone();

        if !update.number_market.trim().is_empty() {
            self.number_market.clone_from(&update.number_market);
        }
        if !update.price.is_zero() {
            self.price = update.price;
        }
        if !update.price_real.is_zero() {
            self.price_real = update.price_real;
        }
        if update.side != Side::None {
            self.side = update.side;
        }
        if !update.portfolio.trim().is_empty() {
            self.portfolio.clone_from(&update.portfolio);
        }
        if !update.volume.is_zero() {
            self.volume = update.volume;
        }
        if !update.volume_executed.is_zero() {
            self.volume_executed = update.volume_executed;
        }
        if update.state != OrderState::None {
            self.state = update.state;
        }
        if !update.time_round_trip.is_zero() {
            self.time_round_trip = update.time_round_trip;
        }
        if self.security.trim().is_empty() {
            self.security.clone_from(&update.security);
        }
        if self.time_callback.is_none() {
            self.time_callback = update.time_callback;
        }

        *self != before
    }
}
