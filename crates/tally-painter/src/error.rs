//! Render boundary errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render target failed: {0}")]
    Target(String),

    #[error("UI dispatcher is closed")]
    DispatcherClosed,

    #[error("UI queue is full")]
    DispatcherBusy,

    #[error("UI thread did not finish the publish within {0:?}")]
    Timeout(std::time::Duration),

    #[error("UI thread dropped the {0} publish")]
    Dropped(&'static str),

    #[error("Failed to start UI thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
