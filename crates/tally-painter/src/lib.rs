//! Refresh scheduler and render boundary for tally.
//!
//! Producers mark the stores dirty at whatever rate events arrive; the
//! [`RefreshScheduler`] wakes at a fixed interval and, only when something
//! changed, hands one immutable snapshot per view to a [`RenderTarget`].
//! Intermediate states between two ticks are never rendered.
//!
//! # Architecture
//!
//! ```text
//! connections ──► StateFeed ──► PortfolioStore / OrderStore (dirty flags)
//!                                         │
//!                            RefreshScheduler (every interval)
//!                                         │ snapshot
//!                                         ▼
//!                     AffineRenderer ──► UiThread ──► RenderTarget
//! ```

pub mod affinity;
pub mod config;
pub mod error;
pub mod render;
pub mod rows;
pub mod scheduler;

pub use affinity::{AffineRenderer, UiDispatcher, UiJob, UiThread};
pub use config::PainterConfig;
pub use error::{RenderError, RenderResult};
pub use render::RenderTarget;
pub use rows::{order_rows, portfolio_rows, OrderRow, PortfolioRow};
pub use scheduler::{PaintSwitch, RefreshScheduler, TickReport};
