//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for orders, amounts and users. These
//! fixtures are consistent and predictable for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{Amount, UserId};
use domain_loyalty::OrderNumber;
use fake::faker::internet::en::Username;
use fake::Fake;
use rust_decimal_macros::dec;

/// Order numbers that pass the checksum
pub const VALID_ORDER_NUMBERS: &[&str] = &[
    "79927398713",
    "12345678903",
    "4561261212345467",
    "2377225624",
    "9278923470",
    "5553",
    "7773",
    "8888",
    "9993",
    "1115",
    "2220",
];

/// Inputs the validator must reject
pub const INVALID_ORDER_NUMBERS: &[&str] = &[
    "79927398710",
    "4561261212345464",
    "12345",
    "",
    "12a45",
    "-5553",
    " 5553",
];

/// Fixture for order numbers
pub struct OrderNumberFixtures;

impl OrderNumberFixtures {
    /// The `i`-th valid number, wrapping around
    pub fn valid(i: usize) -> OrderNumber {
        let raw = VALID_ORDER_NUMBERS[i % VALID_ORDER_NUMBERS.len()];
        OrderNumber::parse(raw).unwrap_or_else(|e| panic!("fixture {raw} is invalid: {e}"))
    }

    /// A valid number derived from `seed`
    ///
    /// Distinct seeds give distinct numbers, which is handy when a test
    /// needs more numbers than the fixed list holds.
    pub fn from_seed(seed: u64) -> OrderNumber {
        OrderNumber::with_check_digit(&format!("{}", 1_000_000 + seed))
            .unwrap_or_else(|e| panic!("seed {seed} does not produce a number: {e}"))
    }
}

/// Fixture for point amounts
pub struct AmountFixtures;

impl AmountFixtures {
    pub fn zero() -> Amount {
        Amount::ZERO
    }

    /// Reward of the sample processed order
    pub fn accrual_500() -> Amount {
        Amount::new(dec!(500))
    }

    /// A fractional accrual as returned by the authority
    pub fn accrual_729_98() -> Amount {
        Amount::new(dec!(729.98))
    }

    pub fn withdraw_100() -> Amount {
        Amount::new(dec!(100))
    }
}

/// Fixture for users
pub struct UserFixtures;

impl UserFixtures {
    pub fn alice() -> UserId {
        UserId::new(1)
    }

    pub fn bob() -> UserId {
        UserId::new(2)
    }

    /// A random login
    pub fn login() -> String {
        let name: String = Username().fake();
        // Faker names repeat; the suffix keeps logins unique within a run
        format!("{}_{}", name, (1000..1_000_000u32).fake::<u32>())
    }
}

/// Fixture for timestamps
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Upload time of the oldest sample order
    pub fn first_upload() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// `minutes` after [`Self::first_upload`]
    pub fn minutes_later(minutes: i64) -> DateTime<Utc> {
        Self::first_upload() + chrono::Duration::minutes(minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_loyalty::order_number::is_valid;
    use std::collections::HashSet;

    #[test]
    fn test_valid_fixtures_pass_checksum() {
        for raw in VALID_ORDER_NUMBERS {
            assert!(is_valid(raw), "{raw} should be valid");
        }
    }

    #[test]
    fn test_invalid_fixtures_fail_checksum() {
        for raw in INVALID_ORDER_NUMBERS {
            assert!(!is_valid(raw), "{raw:?} should be invalid");
        }
    }

    #[test]
    fn test_seeded_numbers_are_distinct() {
        let numbers: HashSet<_> = (0..50).map(OrderNumberFixtures::from_seed).collect();
        assert_eq!(numbers.len(), 50);
    }

    #[test]
    fn test_logins_are_not_empty() {
        assert!(!UserFixtures::login().is_empty());
    }
}
