//! Connection registry and event subscriptions.
//!
//! Each trading-server connection exposes an [`EventHub`] of [`ServerEvent`]s.
//! The [`StateFeed`] subscribes to every registered connection and routes
//! events into the portfolio and order stores. Subscriptions are handles:
//! dropping one revokes the handler, and re-attaching a connection revokes the
//! previous handle first, so a connection is never subscribed twice.
//!
//! # Key Components
//!
//! - [`TradingConnection`]: the black-box connection contract
//! - [`ConnectionRegistry`]: live connections, cancel dispatch by connection kind
//! - [`StateFeed`]: the event-bus adapter in front of the stores
//! - [`EventHub`], [`Subscription`]: handler lists with revocable handles

pub mod adapter;
pub mod connection;
pub mod error;
pub mod event;
pub mod hub;
pub mod registry;

pub use adapter::StateFeed;
pub use connection::TradingConnection;
pub use error::{BusError, BusResult};
pub use event::ServerEvent;
pub use hub::{EventHandler, EventHub, Subscription};
pub use registry::{ConnectionRef, ConnectionRegistry, RegistryEvent};
