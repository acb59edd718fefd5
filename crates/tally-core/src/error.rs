//! Error types for tally-core.

use thiserror::Error;

/// Record validation errors.
///
/// Raised when an incoming record lacks the key it would be stored under.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Portfolio has no account number")]
    MissingAccountNumber,

    #[error("Order has no user number")]
    MissingUserNumber,

    #[error("Trade has no parent order market number (trade id: {0})")]
    MissingParentOrder(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_compare_by_value() {
        let err = CoreError::MissingParentOrder("T1".to_string());
        assert_eq!(err.clone(), err);
        assert_ne!(err, CoreError::MissingUserNumber);
        assert_eq!(
            err.to_string(),
            "Trade has no parent order market number (trade id: T1)"
        );
    }
}
