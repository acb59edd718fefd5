//! Own-trade execution reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Price, Volume};
use crate::error::{CoreError, Result};
use crate::order::Side;
use crate::server::ServerKind;

/// An execution of one of our orders.
///
/// Not stored; only used to retire the parent order from the working set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Trade {
    /// Venue trade number.
    pub number_trade: String,
    /// Venue number of the order that was executed.
    pub number_order_parent: String,
    pub security: String,
    pub side: Side,
    pub volume: Volume,
    pub price: Price,
    pub time: Option<DateTime<Utc>>,
    /// Connection kind the trade was reported by.
    pub server: ServerKind,
}

impl Trade {
    /// Create a trade report for a parent order.
    #[must_use]
    pub fn for_order(number_order_parent: impl Into<String>, server: ServerKind) -> Self {
        Self {
            number_order_parent: number_order_parent.into(),
            server,
            ..Self::default()
        }
    }

    /// Check the trade references a parent order.
    pub fn validate(&self) -> Result<()> {
        if self.number_order_parent.trim().is_empty() {
            return Err(CoreError::MissingParentOrder(self.number_trade.clone()));
        }
        Ok(())
    }
}
