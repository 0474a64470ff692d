//! Order number validation
//!
//! Order numbers are decimal digit strings protected by the Luhn (mod 10)
//! checksum. Both order uploads and withdrawal references must pass it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LoyaltyError;

/// Returns true when `number` is a non-empty digit string with a valid
/// Luhn checksum
///
/// Reading right to left, every second digit is doubled (subtracting 9 when
/// the result exceeds 9) and the sum of all digits must be divisible by 10.
pub fn is_valid(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }

    let mut sum = 0u32;
    for (position, byte) in number.bytes().rev().enumerate() {
        if !byte.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(byte - b'0');
        if position % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum = (sum + digit) % 10;
    }

    sum == 0
}

/// Computes the digit that makes `payload` followed by it Luhn-valid
///
/// Returns `None` when the payload contains a non-digit.
pub fn check_digit(payload: &str) -> Option<u8> {
    let mut sum = 0u32;
    for (position, byte) in payload.bytes().rev().enumerate() {
        if !byte.is_ascii_digit() {
            return None;
        }
        let mut digit = u32::from(byte - b'0');
        // The check digit will occupy position 0, shifting the payload by one
        if position % 2 == 0 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum = (sum + digit) % 10;
    }
    Some(((10 - sum) % 10) as u8)
}

/// A checksum-validated order number
///
/// Construction always goes through [`OrderNumber::parse`], so holding an
/// `OrderNumber` proves the Luhn check passed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Validates and wraps an order number
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyError::InvalidOrderNumber` for empty input, any
    /// non-digit character, or a failed checksum.
    pub fn parse(raw: impl Into<String>) -> Result<Self, LoyaltyError> {
        let raw = raw.into();
        if is_valid(&raw) {
            Ok(Self(raw))
        } else {
            Err(LoyaltyError::InvalidOrderNumber(raw))
        }
    }

    /// Builds a valid number by appending the check digit to `payload`
    pub fn with_check_digit(payload: &str) -> Result<Self, LoyaltyError> {
        let digit = check_digit(payload)
            .ok_or_else(|| LoyaltyError::InvalidOrderNumber(payload.to_string()))?;
        Self::parse(format!("{}{}", payload, digit))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = LoyaltyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> String {
        number.0
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_numbers() {
        assert!(is_valid("4561261212345467"));
        assert!(is_valid("79927398713"));
        assert!(is_valid("12345678903"));
        assert!(is_valid("0"));
    }

    #[test]
    fn test_known_invalid_numbers() {
        assert!(!is_valid("4561261212345464"));
        assert!(!is_valid("79927398710"));
        assert!(!is_valid("1"));
    }

    #[test]
    fn test_rejects_empty_and_non_digits() {
        assert!(!is_valid(""));
        assert!(!is_valid(" 79927398713"));
        assert!(!is_valid("7992739871a"));
        assert!(!is_valid("-0"));
        assert!(!is_valid("４５"));
    }

    #[test]
    fn test_check_digit_completes_number() {
        assert_eq!(check_digit("7992739871"), Some(3));
        assert_eq!(check_digit("456126121234546"), Some(7));
        assert_eq!(check_digit("12a"), None);
    }

    #[test]
    fn test_parse_wraps_valid_number() {
        let number = OrderNumber::parse("79927398713").unwrap();
        assert_eq!(number.as_str(), "79927398713");
        assert!(matches!(
            OrderNumber::parse("79927398714"),
            Err(LoyaltyError::InvalidOrderNumber(_))
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<OrderNumber, _> = serde_json::from_str("\"79927398713\"");
        assert!(ok.is_ok());
        let bad: Result<OrderNumber, _> = serde_json::from_str("\"123\"");
        assert!(bad.is_err());
    }
}
