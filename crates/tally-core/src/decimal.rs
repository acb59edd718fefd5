//! Precision-safe decimal types for account and order values.
//!
//! Uses `rust_decimal` for exact decimal arithmetic so that merged
//! values compare exactly against what the venue reported.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to keep prices and volumes from being mixed up.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Quantity with exact decimal precision.
///
/// Used for order volumes and per-instrument position quantities.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Volume(pub Decimal);

impl Volume {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Volume still waiting to be executed, floored at zero.
    #[inline]
    pub fn remaining(&self, executed: Volume) -> Volume {
        if executed.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - executed.0)
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Volume {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Volume {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_parse() {
        let price: Price = "101.25".parse().unwrap();
        assert_eq!(price.inner(), dec!(101.25));
        assert!(!price.is_zero());
        assert!(Price::default().is_zero());
    }

    #[test]
    fn test_volume_remaining_floors_at_zero() {
        let volume = Volume::new(dec!(10));

        assert_eq!(volume.remaining(Volume::new(dec!(4))), Volume::new(dec!(6)));
        assert_eq!(volume.remaining(Volume::new(dec!(12))), Volume::ZERO);
    }

    #[test]
    fn test_volume_serde_transparent() {
        let volume = Volume::new(dec!(0.5));
        let json = serde_json::to_string(&volume).unwrap();
        assert_eq!(json, "\"0.5\"");
    }
}
