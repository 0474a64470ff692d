//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating order numbers and point
//! amounts that respect domain invariants.

use core_kernel::Amount;
use domain_loyalty::OrderNumber;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for digit strings of 1 to 19 digits
pub fn digit_string_strategy() -> impl Strategy<Value = String> {
    "[0-9]{1,19}"
}

/// Strategy for valid order numbers
///
/// Generates a payload and appends its check digit.
pub fn order_number_strategy() -> impl Strategy<Value = OrderNumber> {
    "[1-9][0-9]{2,15}".prop_filter_map("payload must produce a number", |payload| {
        OrderNumber::with_check_digit(&payload).ok()
    })
}

/// Strategy for strings containing at least one non-digit
pub fn non_digit_string_strategy() -> impl Strategy<Value = String> {
    "[0-9]{0,6}[a-zA-Z -][0-9]{0,6}"
}

/// Strategy for positive amounts in minor units (1 to 10 million points)
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for positive point amounts
pub fn positive_amount_strategy() -> impl Strategy<Value = Amount> {
    positive_amount_minor_strategy().prop_map(Amount::from_minor)
}

/// Strategy for positive decimals with up to two fractional digits
pub fn positive_decimal_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_loyalty::order_number::is_valid;

    proptest! {
        #[test]
        fn generated_numbers_are_valid(number in order_number_strategy()) {
            prop_assert!(is_valid(number.as_str()));
        }

        #[test]
        fn non_digit_strings_are_rejected(raw in non_digit_string_strategy()) {
            prop_assert!(!is_valid(&raw));
            prop_assert!(OrderNumber::parse(raw).is_err());
        }

        #[test]
        fn generated_amounts_are_positive(amount in positive_amount_strategy()) {
            prop_assert!(amount.is_positive());
        }
    }
}
