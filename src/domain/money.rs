//! Monetary value objects.
//!
//! All arithmetic is fixed-point via `rust_decimal`; binary floating point
//! never touches a ledger amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::error::LedgerError;

/// A non-negative monetary amount, as carried by one side of a journal line.
///
/// Zero is a valid value: a conventional line has an amount on exactly one
/// side and zero on the other. Negative values are rejected at construction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_negative_amounts() {
        assert!(matches!(
            Amount::new(dec!(-0.01)),
            Err(LedgerError::NegativeAmount(_))
        ));
    }

    #[test]
    fn zero_is_valid() {
        let zero = Amount::new(dec!(0)).unwrap();
        assert!(zero.is_zero());
        assert_eq!(zero, Amount::ZERO);
    }

    #[test]
    fn sums_over_iterators() {
        let amounts = [dec!(1.5), dec!(2.5), dec!(96)]
            .into_iter()
            .map(|d| Amount::new(d).unwrap());
        assert_eq!(amounts.sum::<Amount>().value(), dec!(100));
    }

    #[test]
    fn serde_round_trip_rejects_negative() {
        let ok: Amount = serde_json::from_str("\"10.25\"").unwrap();
        assert_eq!(ok.value(), dec!(10.25));
        assert!(serde_json::from_str::<Amount>("\"-1\"").is_err());
    }
}
