//! Error types for tally-bus.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("Connection already registered: {0}")]
    DuplicateConnection(String),

    #[error("Connection {connection} rejected cancel: {reason}")]
    CancelRejected { connection: String, reason: String },

    #[error("Connection closed: {0}")]
    ConnectionClosed(String),
}

pub type BusResult<T> = Result<T, BusError>;
