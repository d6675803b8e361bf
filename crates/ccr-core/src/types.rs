//! Common value types used throughout the portal

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a value cannot be used as a progress percentage
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentError {
    #[error("is not a number")]
    NotANumber,
    #[error("must be between 0 and 100")]
    OutOfRange,
    #[error("must have at most two decimal places")]
    TooPrecise,
}

/// Completion percentage in `[0, 100]` with two decimal places
///
/// Stored as `NUMERIC(5,2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percent(Decimal);

impl Percent {
    pub const ZERO: Percent = Percent(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, PercentError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(PercentError::OutOfRange);
        }
        if value.normalize().scale() > 2 {
            return Err(PercentError::TooPrecise);
        }
        let mut value = value;
        value.rescale(2);
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_complete(&self) -> bool {
        self.0 == Decimal::ONE_HUNDRED
    }
}

impl Default for Percent {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = PercentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Percent::new(value)
    }
}

impl From<Percent> for Decimal {
    fn from(percent: Percent) -> Self {
        percent.0
    }
}

impl FromStr for Percent {
    type Err = PercentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| PercentError::NotANumber)?;
        Percent::new(value)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert_eq!("0".parse::<Percent>().map(|p| p.to_string()), Ok("0.00".into()));
        assert_eq!("100".parse::<Percent>().map(|p| p.to_string()), Ok("100.00".into()));
        assert!("100".parse::<Percent>().map(|p| p.is_complete()).unwrap_or(false));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!("-0.01".parse::<Percent>(), Err(PercentError::OutOfRange));
        assert_eq!("100.01".parse::<Percent>(), Err(PercentError::OutOfRange));
        assert_eq!("150".parse::<Percent>(), Err(PercentError::OutOfRange));
    }

    #[test]
    fn test_precision() {
        assert_eq!("42.125".parse::<Percent>(), Err(PercentError::TooPrecise));
        // trailing zeros do not count as precision
        assert_eq!(
            "42.5000".parse::<Percent>().map(|p| p.to_string()),
            Ok("42.50".into())
        );
    }

    #[test]
    fn test_not_a_number() {
        assert_eq!("abc".parse::<Percent>(), Err(PercentError::NotANumber));
        assert_eq!("".parse::<Percent>(), Err(PercentError::NotANumber));
    }

    #[test]
    fn test_serde() {
        let p: Percent = serde_json::from_str("\"37.5\"").unwrap();
        assert_eq!(p.to_string(), "37.50");
        assert!(serde_json::from_str::<Percent>("\"101\"").is_err());
    }

    #[test]
    fn test_ordering_ignores_scale() {
        let a: Percent = "50".parse().unwrap();
        let b = Percent::new(Decimal::new(5000, 2)).unwrap();
        assert_eq!(a, b);
        assert!(Percent::ZERO < a);
    }
}
