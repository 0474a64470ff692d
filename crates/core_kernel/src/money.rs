//! Point amounts with precise decimal arithmetic
//!
//! Loyalty points are fixed-point values with two fractional digits. This
//! module wraps rust_decimal so that balances are summed and compared
//! exactly, without binary floating-point drift.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional digits carried by every amount
pub const AMOUNT_SCALE: u32 = 2;

/// Errors that can occur during amount operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A quantity of loyalty points
///
/// The wrapped decimal is always rounded to two places on construction, so
/// `Amount` values compare and hash by their persisted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero points
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates an amount, rounding half away from zero to two places
    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp_with_strategy(
            AMOUNT_SCALE,
            rust_decimal::RoundingStrategy::MidpointAwayFromZero,
        ))
    }

    /// Creates an amount from integer minor units (hundredths)
    pub fn from_minor(minor_units: i64) -> Self {
        Self(Decimal::new(minor_units, AMOUNT_SCALE))
    }

    /// Returns the amount in minor units
    pub fn to_minor(&self) -> Result<i64, MoneyError> {
        (self.0 * dec!(100)).trunc().to_i64().ok_or(MoneyError::Overflow)
    }

    /// Creates an amount that must be strictly positive
    pub fn positive(value: Decimal) -> Result<Self, MoneyError> {
        let amount = Self::new(value);
        if !amount.is_positive() {
            return Err(MoneyError::InvalidAmount(format!(
                "{} must be greater than zero",
                value
            )));
        }
        Ok(amount)
    }

    /// Returns the underlying decimal
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Checked addition
    pub fn checked_add(&self, other: &Amount) -> Result<Amount, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self::new)
            .ok_or(MoneyError::Overflow)
    }

    /// Checked subtraction; the result may be negative
    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, MoneyError> {
        self.0
            .checked_sub(other.0)
            .map(Self::new)
            .ok_or(MoneyError::Overflow)
    }

    /// Sums amounts, failing on overflow instead of panicking
    pub fn try_sum<'a, I>(amounts: I) -> Result<Amount, MoneyError>
    where
        I: IntoIterator<Item = &'a Amount>,
    {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a))
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::ZERO
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Decimal {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Self::new)
            .map_err(|e| MoneyError::InvalidAmount(format!("{}: {}", s, e)))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn amount_minor_units_survive_arithmetic(
            a in -1_000_000_000i64..1_000_000_000i64,
            b in -1_000_000_000i64..1_000_000_000i64,
        ) {
            let ma = Amount::from_minor(a);
            let mb = Amount::from_minor(b);

            let sum = ma.checked_add(&mb).unwrap();
            prop_assert_eq!(sum.to_minor().unwrap(), a + b);
            prop_assert_eq!(sum.checked_sub(&mb).unwrap(), ma);
        }

        #[test]
        fn amount_addition_is_associative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64,
            c in -1_000_000i64..1_000_000i64
        ) {
            let ma = Amount::from_minor(a);
            let mb = Amount::from_minor(b);
            let mc = Amount::from_minor(c);

            let left = ma.checked_add(&mb).unwrap().checked_add(&mc).unwrap();
            let right = ma.checked_add(&mb.checked_add(&mc).unwrap()).unwrap();
            prop_assert_eq!(left, right);
        }
    }
}
