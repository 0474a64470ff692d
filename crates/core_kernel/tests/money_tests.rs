//! Unit tests for the Amount module
//!
//! Tests cover construction, rounding, checked arithmetic, parsing and
//! serialization of point amounts.

use core_kernel::{Amount, MoneyError};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_keeps_two_decimal_places() {
        let a = Amount::new(dec!(100.50));
        assert_eq!(a.value(), dec!(100.50));
    }

    #[test]
    fn test_new_rounds_midpoint_away_from_zero() {
        assert_eq!(Amount::new(dec!(0.005)).value(), dec!(0.01));
        assert_eq!(Amount::new(dec!(-0.005)).value(), dec!(-0.01));
        assert_eq!(Amount::new(dec!(0.004)).value(), dec!(0.00));
    }

    #[test]
    fn test_zero_is_default() {
        assert_eq!(Amount::default(), Amount::ZERO);
        assert!(Amount::ZERO.is_zero());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::ZERO.is_negative());
    }

    #[test]
    fn test_positive_reports_invalid_amount() {
        let err = Amount::positive(dec!(-5)).unwrap_err();
        assert!(matches!(err, MoneyError::InvalidAmount(_)));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_and_sub() {
        let a = Amount::new(dec!(500.00));
        let b = Amount::new(dec!(499.99));

        assert_eq!(a.checked_sub(&b).unwrap(), Amount::from_minor(1));
        assert_eq!(a.checked_add(&b).unwrap(), Amount::new(dec!(999.99)));
    }

    #[test]
    fn test_subtraction_can_go_negative() {
        let a = Amount::new(dec!(1.00));
        let b = Amount::new(dec!(1.01));
        let diff = a.checked_sub(&b).unwrap();
        assert!(diff.is_negative());
        assert_eq!(diff, Amount::from_minor(-1));
    }

    #[test]
    fn test_try_sum_of_empty_is_zero() {
        let empty: Vec<Amount> = Vec::new();
        assert_eq!(Amount::try_sum(&empty).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_ordering_is_numeric() {
        assert!(Amount::new(dec!(0.01)) > Amount::ZERO);
        assert!(Amount::new(dec!(10)) > Amount::new(dec!(9.99)));
        assert_eq!(Amount::new(dec!(5)), Amount::new(dec!(5.00)));
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_amount_parses_from_string() {
        let a: Amount = " 42.10 ".parse().unwrap();
        assert_eq!(a, Amount::from_minor(4210));
    }

    #[test]
    fn test_amount_serde_is_transparent() {
        let a = Amount::new(dec!(12.34));
        let json = serde_json::to_string(&a).unwrap();
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
