//! Core domain types for the tally aggregator.
//!
//! This crate provides the records that flow from trading-server connections
//! into the state stores:
//! - `Portfolio`, `PositionOnBoard`: account cash/margin state keyed by account number
//! - `Order`: a trading instruction keyed by its user-assigned number
//! - `Trade`: a transient execution report referencing a parent order
//! - `ServerKind`: the originating connection kind (live venue or simulation)
//! - `Price`, `Volume`: precision-safe numeric types

pub mod decimal;
pub mod error;
pub mod order;
pub mod portfolio;
pub mod server;
pub mod trade;

pub use decimal::{Price, Volume};
pub use error::{CoreError, Result};
pub use order::{Order, OrderState, OrderType, Side};
pub use portfolio::{Portfolio, PositionOnBoard};
pub use server::ServerKind;
pub use trade::Trade;
