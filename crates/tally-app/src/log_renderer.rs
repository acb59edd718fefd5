//! Render target writing the two views to the log.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use tally_core::{Order, Portfolio};
use tally_painter::{order_rows, portfolio_rows, PortfolioRow, RenderResult, RenderTarget};
use tally_state::PortfolioStore;

/// Headless renderer: one log line per display row.
pub struct LogRenderer {
    portfolios: Arc<PortfolioStore>,
}

impl LogRenderer {
    /// `portfolios` resolves the account cell of order rows.
    pub fn new(portfolios: Arc<PortfolioStore>) -> Self {
        Self { portfolios }
    }
}

impl RenderTarget for LogRenderer {
    fn publish_portfolios(&self, portfolios: Vec<Portfolio>) -> RenderResult<()> {
        info!(accounts = portfolios.len(), "Portfolio view");
        for row in portfolio_rows(&portfolios) {
            match row {
                PortfolioRow::Account {
                    number,
                    value_begin,
                    value_current,
                    value_blocked,
                } => info!(
                    account = %number,
                    %value_begin,
                    %value_current,
                    %value_blocked,
                    "  account"
                ),
                PortfolioRow::Position {
                    account,
                    security,
                    value_begin,
                    value_current,
                    value_blocked,
                } => info!(
                    %account,
                    %security,
                    value_begin = %value_begin.inner(),
                    value_current = %value_current.inner(),
                    value_blocked = %value_blocked.inner(),
                    "    position"
                ),
                PortfolioRow::NoPositions { account } => {
                    info!(%account, "    no positions")
                }
            }
        }
        Ok(())
    }

    fn publish_orders(&self, orders: Vec<Order>) -> RenderResult<()> {
        let known: HashSet<String> = self
            .portfolios
            .snapshot()
            .into_iter()
            .map(|p| p.number)
            .collect();

        info!(orders = orders.len(), "Working orders view");
        for row in order_rows(&orders, &known) {
            info!(
                number_user = row.number_user,
                number_market = %row.number_market,
                security = %row.security,
                account = %row.portfolio,
                side = %row.side,
                state = %row.state,
                price = %row.price.inner(),
                volume = %row.volume.inner(),
                executed = %row.volume_executed.inner(),
                left = %row.volume_left.inner(),
                order_type = %row.order_type,
                round_trip_ms = row.round_trip_ms as u64,
                "  order"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{OrderState, ServerKind, Side};

    #[test]
    fn test_publish_never_fails() {
        let portfolios = Arc::new(PortfolioStore::new());
        portfolios.merge(vec![Portfolio::new("A1")]);
        let renderer = LogRenderer::new(portfolios.clone());

        let mut order = Order::new(1, ServerKind::Quik);
        order.portfolio = "B2".to_string();
        order.side = Side::Buy;
        order.state = OrderState::Active;

        assert!(renderer.publish_portfolios(portfolios.snapshot()).is_ok());
        assert!(renderer.publish_orders(vec![order]).is_ok());
    }
}
