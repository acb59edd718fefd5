//! Prometheus metrics for the aggregation pipeline.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a programming error that should crash on
//! first use rather than silently drop observations.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_int_gauge, CounterVec, IntGauge};

/// Connection events received, by kind (portfolios/order/trade).
pub static EVENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tally_events_total",
        "Connection events received by the state feed",
        &["kind"]
    )
    .unwrap()
});

/// Records dropped before reaching a store, by reason.
pub static RECORDS_SKIPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tally_records_skipped_total",
        "Incoming records skipped by the stores",
        &["reason"]
    )
    .unwrap()
});

/// Snapshots handed to the render boundary, by view (portfolios/orders).
pub static SNAPSHOTS_PUBLISHED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tally_snapshots_published_total",
        "Snapshots published to the render boundary",
        &["view"]
    )
    .unwrap()
});

/// Failed snapshot publications, by view.
pub static PUBLISH_FAILED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tally_publish_failed_total",
        "Snapshot publications that failed",
        &["view"]
    )
    .unwrap()
});

/// Cancel requests, by outcome (sent/no_connection/failed).
pub static CANCEL_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tally_cancel_requests_total",
        "Order cancel requests dispatched to connections",
        &["outcome"]
    )
    .unwrap()
});

/// Orders currently held by the order store (visible or not).
pub static ORDERS_STORED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("tally_orders_stored", "Orders held by the order store").unwrap()
});

/// Portfolios currently held by the portfolio store.
pub static PORTFOLIOS_STORED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "tally_portfolios_stored",
        "Portfolios held by the portfolio store"
    )
    .unwrap()
});

/// Metrics helper for recording observations.
pub struct Metrics;

impl Metrics {
    /// Record a connection event.
    pub fn event_received(kind: &str) {
        EVENTS_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a skipped record.
    pub fn record_skipped(reason: &str) {
        RECORDS_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a published snapshot.
    pub fn snapshot_published(view: &str) {
        SNAPSHOTS_PUBLISHED_TOTAL.with_label_values(&[view]).inc();
    }

    /// Record a failed publication.
    pub fn publish_failed(view: &str) {
        PUBLISH_FAILED_TOTAL.with_label_values(&[view]).inc();
    }

    /// Record a cancel request outcome.
    pub fn cancel_request(outcome: &str) {
        CANCEL_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Set the number of stored orders.
    pub fn orders_stored(count: usize) {
        ORDERS_STORED.set(count as i64);
    }

    /// Set the number of stored portfolios.
    pub fn portfolios_stored(count: usize) {
        PORTFOLIOS_STORED.set(count as i64);
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn render() -> crate::TelemetryResult<String> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = EVENTS_TOTAL.with_label_values(&["order"]).get();
        Metrics::event_received("order");
        let after = EVENTS_TOTAL.with_label_values(&["order"]).get();
        assert!(after >= before + 1.0);
    }

    #[test]
    fn test_render_contains_metric() {
        Metrics::snapshot_published("orders");
        let text = Metrics::render().unwrap();
        assert!(text.contains("tally_snapshots_published_total"));
    }
}
