//! Money amounts in minor units.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::iter::Sum;
use std::ops::{Add, Mul};
use std::str::FromStr;

/// A non-negative money amount held in minor units (paise).
///
/// Displayed and wire-encoded with exactly two decimals (`"45.50"`), persisted as a JSON
/// number (`45.5`). Arithmetic saturates instead of overflowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Amount(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountConversionError(String);

impl Display for AmountConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value cannot be represented as an amount: {}", self.0)
    }
}

impl std::error::Error for AmountConversionError {}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_paise(paise: u64) -> Self {
        Self(paise)
    }

    /// Saturates at the largest representable amount.
    pub fn from_rupees(rupees: u64) -> Self {
        Self(rupees.saturating_mul(100))
    }

    pub fn paise(&self) -> u64 {
        self.0
    }

    /// Fixed two-decimal representation used on the wire and in payment requests.
    pub fn to_fixed(&self) -> String {
        self.to_string()
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.0 as f64 / 100.0
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(AmountConversionError(value.to_string()));
        }
        let paise = (value * 100.0).round();
        if paise > u64::MAX as f64 {
            return Err(AmountConversionError(value.to_string()));
        }
        Ok(Self(paise as u64))
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| AmountConversionError(s.to_string()))?;
        Self::try_from(value)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u32> for Amount {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_mul(u64::from(rhs)))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_two_decimals() {
        assert_eq!(Amount::from_paise(4550).to_string(), "45.50");
        assert_eq!(Amount::from_paise(5).to_string(), "0.05");
        assert_eq!(Amount::from_rupees(120).to_fixed(), "120.00");
    }

    #[test]
    fn test_parse_and_rounding() {
        assert_eq!("45.5".parse::<Amount>().unwrap(), Amount::from_paise(4550));
        assert_eq!(" 20 ".parse::<Amount>().unwrap(), Amount::from_rupees(20));
        assert_eq!(Amount::try_from(0.1 + 0.2).unwrap(), Amount::from_paise(30));
        assert!("-1".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
        assert!(Amount::try_from(f64::NAN).is_err());
    }

    #[test]
    fn test_arithmetic() {
        let line = Amount::from_rupees(15) * 3;
        let total: Amount = vec![line, Amount::from_paise(50)].into_iter().sum();
        assert_eq!(total, Amount::from_paise(4550));
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Amount::from_paise(u64::MAX);
        assert_eq!(Amount::from_rupees(u64::MAX), max);
        assert_eq!(max + Amount::from_rupees(1), max);
        assert_eq!(Amount::from_rupees(u64::MAX / 100) * u32::MAX, max);
        let total: Amount = vec![max, max].into_iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&Amount::from_paise(4550)).unwrap();
        assert_eq!(json, "45.5");
        let back: Amount = serde_json::from_str("45.5").unwrap();
        assert_eq!(back, Amount::from_paise(4550));
        assert!(serde_json::from_str::<Amount>("-3").is_err());
    }
}
