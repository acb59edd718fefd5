//! Render boundary contract.

use tally_core::{Order, Portfolio};

use crate::error::RenderResult;

/// Consumer of store snapshots (a grid widget, a terminal table, a log).
///
/// Each call hands over a complete, immutable snapshot of one view; the
/// target replaces whatever it displayed before.
pub trait RenderTarget: Send + Sync {
    fn publish_portfolios(&self, portfolios: Vec<Portfolio>) -> RenderResult<()>;

    /// Orders arrive newest first.
    fn publish_orders(&self, orders: Vec<Order>) -> RenderResult<()>;
}
