//! Error types for tally-state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Cancel failed for order {number_user}: {reason}")]
    Cancel { number_user: u64, reason: String },

    #[error("Invalid record: {0}")]
    Invalid(#[from] tally_core::CoreError),
}

pub type StateResult<T> = Result<T, StateError>;
