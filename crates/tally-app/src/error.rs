//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Bus(#[from] tally_bus::BusError),

    #[error("Render error: {0}")]
    Render(#[from] tally_painter::RenderError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tally_telemetry::TelemetryError),

    #[error("Replay error in {file}: {reason}")]
    Replay { file: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
