//! Flattening of snapshots into display rows.
//!
//! A portfolio becomes one account row followed by one row per position, or
//! by a single "no positions" row when the venue reported none. An order
//! becomes one row; its account cell is left blank when the account is not
//! among the known portfolios.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tally_core::{Order, OrderState, OrderType, Portfolio, Price, Side, Volume};

/// One line of the portfolio view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum PortfolioRow {
    Account {
        number: String,
        value_begin: Decimal,
        value_current: Decimal,
        value_blocked: Decimal,
    },
    Position {
        account: String,
        security: String,
        value_begin: Volume,
        value_current: Volume,
        value_blocked: Volume,
    },
    NoPositions {
        account: String,
    },
}

/// One line of the working-orders view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRow {
    pub number_user: u64,
    pub number_market: String,
    pub time_create: Option<DateTime<Utc>>,
    pub security: String,
    /// Empty when the order references an unknown account.
    pub portfolio: String,
    pub side: Side,
    pub state: OrderState,
    pub price: Price,
    pub price_real: Price,
    pub volume: Volume,
    pub volume_executed: Volume,
    /// Volume still to be filled.
    pub volume_left: Volume,
    pub order_type: OrderType,
    pub round_trip_ms: u128,
}

/// Rows for the portfolio view. Records without an account number are skipped.
pub fn portfolio_rows(portfolios: &[Portfolio]) -> Vec<PortfolioRow> {
    let mut rows = Vec::with_capacity(portfolios.len() * 2);

    for portfolio in portfolios.iter().filter(|p| p.validate().is_ok()) {
        rows.push(PortfolioRow::Account {
            number: portfolio.number.clone(),
            value_begin: portfolio.value_begin,
            value_current: portfolio.value_current,
            value_blocked: portfolio.value_blocked,
        });

        let positions = portfolio.positions();
        if positions.is_empty() {
            rows.push(PortfolioRow::NoPositions {
                account: portfolio.number.clone(),
            });
            continue;
        }

        rows.extend(positions.iter().map(|position| PortfolioRow::Position {
            account: portfolio.number.clone(),
            security: position.security.clone(),
            value_begin: position.value_begin,
            value_current: position.value_current,
            value_blocked: position.value_blocked,
        }));
    }

    rows
}

/// Rows for the working-orders view, in snapshot order.
///
/// `known_accounts` are the account numbers currently in the portfolio view.
pub fn order_rows(orders: &[Order], known_accounts: &HashSet<String>) -> Vec<OrderRow> {
    orders
        .iter()
        .map(|order| OrderRow {
            number_user: order.number_user,
            number_market: order.number_market.clone(),
            time_create: order.time_create,
            security: order.security.clone(),
            portfolio: if known_accounts.contains(&order.portfolio) {
                order.portfolio.clone()
            } else {
                String::new()
            },
            side: order.side,
            state: order.state,
            price: order.price,
            price_real: order.price_real,
            volume: order.volume,
            volume_executed: order.volume_executed,
            volume_left: order.volume.remaining(order.volume_executed),
            order_type: order.order_type,
            round_trip_ms: order.time_round_trip.as_millis(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::{PositionOnBoard, ServerKind};

    #[test]
    fn test_portfolio_without_positions_gets_placeholder() {
        let rows = portfolio_rows(&[Portfolio::new("A1")]);

        assert_eq!(rows.len(), 2);
        assert!(matches!(&rows[0], PortfolioRow::Account { number, .. } if number == "A1"));
        assert!(matches!(&rows[1], PortfolioRow::NoPositions { account } if account == "A1"));
    }

    #[test]
    fn test_positions_follow_account_row() {
        let mut portfolio = Portfolio::new("A1");
        portfolio.value_current = dec!(1500);
        portfolio.positions = Some(vec![
            PositionOnBoard {
                security: "SBER".to_string(),
                value_current: Volume::new(dec!(10)),
                ..PositionOnBoard::default()
            },
            PositionOnBoard {
                security: "GAZP".to_string(),
                ..PositionOnBoard::default()
            },
        ]);

        let rows = portfolio_rows(&[portfolio, Portfolio::new("B2")]);

        assert_eq!(rows.len(), 5);
        assert!(matches!(
            &rows[0],
            PortfolioRow::Account { value_current, .. } if *value_current == dec!(1500)
        ));
        assert!(matches!(&rows[1], PortfolioRow::Position { security, .. } if security == "SBER"));
        assert!(matches!(&rows[2], PortfolioRow::Position { security, .. } if security == "GAZP"));
        assert!(matches!(&rows[3], PortfolioRow::Account { number, .. } if number == "B2"));
        assert!(matches!(&rows[4], PortfolioRow::NoPositions { .. }));
    }

    #[test]
    fn test_malformed_portfolio_is_skipped() {
        let rows = portfolio_rows(&[Portfolio::new(" "), Portfolio::new("A1")]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_unknown_account_renders_blank() {
        let mut known = Order::new(1, ServerKind::Quik);
        known.portfolio = "A1".to_string();
        let mut dangling = Order::new(2, ServerKind::Quik);
        dangling.portfolio = "GONE".to_string();

        let accounts: HashSet<String> = ["A1".to_string()].into_iter().collect();
        let rows = order_rows(&[known, dangling], &accounts);

        assert_eq!(rows[0].portfolio, "A1");
        assert_eq!(rows[1].portfolio, "");
        assert_eq!(rows[1].number_user, 2);
    }

    #[test]
    fn test_volume_left_column() {
        let mut partly = Order::new(1, ServerKind::Quik);
        partly.volume = Volume::new(dec!(10));
        partly.volume_executed = Volume::new(dec!(4));
        let mut overfilled = Order::new(2, ServerKind::Quik);
        overfilled.volume = Volume::new(dec!(1));
        overfilled.volume_executed = Volume::new(dec!(3));

        let rows = order_rows(&[partly, overfilled], &HashSet::new());

        assert_eq!(rows[0].volume_left, Volume::new(dec!(6)));
        assert_eq!(rows[1].volume_left, Volume::ZERO);
    }
}
