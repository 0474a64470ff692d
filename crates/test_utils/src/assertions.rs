//! Custom Test Assertions
//!
//! Provides assertion helpers for loyalty types that give more meaningful
//! failure messages than standard assertions.

use core_kernel::Amount;
use domain_loyalty::{Balance, Order, OrderStatus};
use rust_decimal::Decimal;

/// Asserts a balance by its two components
///
/// # Panics
///
/// Panics if either component differs
pub fn assert_balance(balance: &Balance, current: Decimal, withdrawn: Decimal) {
    assert_eq!(
        balance.current,
        Amount::new(current),
        "Current balance mismatch: actual={}, expected={}",
        balance.current,
        current
    );
    assert_eq!(
        balance.withdrawn,
        Amount::new(withdrawn),
        "Withdrawn total mismatch: actual={}, expected={}",
        balance.withdrawn,
        withdrawn
    );
}

/// Asserts an order's status
pub fn assert_order_status(order: &Order, expected: OrderStatus) {
    assert_eq!(
        order.status, expected,
        "Order {} has status {}, expected {}",
        order.number, order.status, expected
    );
}

/// Asserts that an order is `PROCESSED` with the given reward
pub fn assert_processed_with(order: &Order, accrual: Decimal) {
    assert_order_status(order, OrderStatus::Processed);
    assert_eq!(
        order.accrual,
        Amount::new(accrual),
        "Order {} accrual mismatch",
        order.number
    );
}

/// Asserts that orders are listed newest first
pub fn assert_newest_first(orders: &[Order]) {
    for pair in orders.windows(2) {
        assert!(
            pair[0].uploaded_at >= pair[1].uploaded_at,
            "Order {} uploaded at {} is listed before newer order {} uploaded at {}",
            pair[0].number,
            pair[0].uploaded_at,
            pair[1].number,
            pair[1].uploaded_at
        );
    }
}
