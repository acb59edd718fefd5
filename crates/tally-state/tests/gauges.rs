//! Stored-record gauges under concurrent writers.
//!
//! The gauges are process-wide, so this binary holds a single test and a
//! single store of each kind.

use std::sync::Arc;
use std::thread;

use tally_core::{Order, Portfolio, ServerKind, Trade};
use tally_state::{OrderStore, PortfolioStore};
use tally_telemetry::Metrics;

fn gauge(name: &str) -> i64 {
    let report = Metrics::render().unwrap();
    let prefix = format!("{name} ");
    report
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .unwrap_or_else(|| panic!("{name} missing from metrics"))
        .trim()
        .parse::<f64>()
        .unwrap() as i64
}

fn order(number_user: u64) -> Order {
    Order {
        number_market: format!("M{number_user}"),
        ..Order::new(number_user, ServerKind::Quik)
    }
}

#[test]
fn test_gauges_match_store_sizes_after_concurrent_writes() {
    let orders = Arc::new(OrderStore::new());
    let portfolios = Arc::new(PortfolioStore::new());

    let writers: Vec<_> = (0..8u64)
        .map(|worker| {
            let orders = orders.clone();
            let portfolios = portfolios.clone();
            thread::spawn(move || {
                for n in 0..200u64 {
                    let number_user = worker * 1_000 + n + 1;
                    orders.upsert(order(number_user));
                    if n % 3 == 0 {
                        orders.remove_on_trade(&Trade::for_order(
                            format!("M{number_user}"),
                            ServerKind::Quik,
                        ));
                    }
                    portfolios.merge(vec![Portfolio::new(format!("ACC-{worker}-{}", n % 17))]);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(orders.len(), 8 * (200 - 67));
    assert_eq!(gauge("tally_orders_stored"), orders.len() as i64);
    assert_eq!(portfolios.len(), 8 * 17);
    assert_eq!(gauge("tally_portfolios_stored"), portfolios.len() as i64);

    orders.clear();
    portfolios.clear();
    assert_eq!(gauge("tally_orders_stored"), 0);
    assert_eq!(gauge("tally_portfolios_stored"), 0);
}
