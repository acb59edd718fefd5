//! Live portfolio and working-order aggregator.
//!
//! Wires the pieces together:
//! - replay connections registered in a `ConnectionRegistry`
//! - a `StateFeed` routing their events into the portfolio and order stores
//! - a `RefreshScheduler` painting store snapshots through the UI thread

pub mod app;
pub mod config;
pub mod error;
pub mod log_renderer;
pub mod replay;

pub use app::Application;
pub use config::{AppConfig, ConnectionConfig};
pub use error::{AppError, AppResult};
pub use log_renderer::LogRenderer;
pub use replay::ReplayConnection;
