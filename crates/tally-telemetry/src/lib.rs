//! Structured logging, operator log sink and Prometheus metrics for tally.
//!
//! - `init_logging`: tracing subscriber setup (JSON in production, pretty otherwise)
//! - `LogSink`: fire-and-forget operator messages with a synchronous fallback alert
//! - `Metrics`: counters and gauges for the aggregation pipeline

pub mod error;
pub mod log_sink;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use log_sink::{AlertFallback, LogMessage, LogSink, Severity};
pub use logging::init_logging;
pub use metrics::Metrics;
