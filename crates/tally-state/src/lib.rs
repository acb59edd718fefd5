//! Thread-safe portfolio and order stores.
//!
//! Producers (one per live connection) mutate the stores concurrently; a
//! single refresh loop reads snapshots. Each store guards its whole
//! collection with one coarse lock and owns a [`DirtyFlag`] that coalesces
//! any number of mutations into a single "something changed" signal.
//!
//! # Key Components
//!
//! - [`PortfolioStore`]: portfolios keyed by account number, whole-record replacement
//! - [`OrderStore`]: orders keyed by user number, field-by-field merge, trade-driven removal
//! - [`OrderCanceller`]: cancel capability dispatched by connection kind
//! - [`DirtyFlag`]: atomic "unpublished changes" flag

pub mod dirty;
pub mod error;
pub mod order_store;
pub mod portfolio_store;

pub use dirty::DirtyFlag;
pub use error::{StateError, StateResult};
pub use order_store::{
    CancelOutcome, CloseAllReport, CloseOutcome, OrderCanceller, OrderStore, UpsertOutcome,
};
pub use portfolio_store::PortfolioStore;
