//! Portfolio records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Volume;
use crate::error::{CoreError, Result};

/// Holdings of one instrument inside a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionOnBoard {
    /// Instrument code (e.g. "SBER", "BTCUSDT").
    pub security: String,
    /// Quantity at session open.
    #[serde(default)]
    pub value_begin: Volume,
    /// Current quantity.
    #[serde(default)]
    pub value_current: Volume,
    /// Quantity reserved by working orders.
    #[serde(default)]
    pub value_blocked: Volume,
}

/// Aggregate cash/margin state of one trading account.
///
/// Stored and replaced as a whole: a newer record for the same account
/// number supersedes every field of the older one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Portfolio {
    /// Account number (store key).
    pub number: String,
    /// Account value at session open.
    #[serde(default)]
    pub value_begin: Decimal,
    /// Current account value.
    #[serde(default)]
    pub value_current: Decimal,
    /// Value reserved as margin.
    #[serde(default)]
    pub value_blocked: Decimal,
    /// Per-instrument breakdown. `None` when the venue did not report positions.
    #[serde(default)]
    pub positions: Option<Vec<PositionOnBoard>>,
}

impl Portfolio {
    /// Create an empty portfolio for an account.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ..Self::default()
        }
    }

    /// Check the record can be keyed.
    pub fn validate(&self) -> Result<()> {
        if self.number.trim().is_empty() {
            return Err(CoreError::MissingAccountNumber);
        }
        Ok(())
    }

    /// Positions reported for this account, empty when none were reported.
    pub fn positions(&self) -> &[PositionOnBoard] {
        self.positions.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_requires_number() {
        assert!(Portfolio::new("A1").validate().is_ok());
        assert_eq!(
            Portfolio::new("  ").validate(),
            Err(CoreError::MissingAccountNumber)
        );
    }

    #[test]
    fn test_positions_defaults_to_empty() {
        let portfolio = Portfolio::new("A1");
        assert!(portfolio.positions().is_empty());
    }

    #[test]
    fn test_deserialize_partial_record() {
        let json = r#"{"number":"A1","value_current":"900"}"#;
        let portfolio: Portfolio = serde_json::from_str(json).unwrap();

        assert_eq!(portfolio.number, "A1");
        assert_eq!(portfolio.value_current, dec!(900));
        assert_eq!(portfolio.value_begin, Decimal::ZERO);
        assert!(portfolio.positions.is_none());
    }
}
