//! Test Data Builders
//!
//! Provides builder patterns for constructing orders and withdrawals with
//! sensible defaults. Tests specify only the relevant fields.

use chrono::{DateTime, Utc};
use core_kernel::{Amount, UserId};
use domain_loyalty::{Order, OrderNumber, OrderStatus, Withdrawal};
use rust_decimal::Decimal;

use crate::fixtures::{AmountFixtures, OrderNumberFixtures, TemporalFixtures, UserFixtures};

/// Builder for constructing test orders
///
/// The builder writes fields directly, so it can produce any stored state
/// without walking the order through its transitions.
pub struct TestOrderBuilder {
    number: OrderNumber,
    owner: UserId,
    status: OrderStatus,
    accrual: Amount,
    uploaded_at: DateTime<Utc>,
}

impl Default for TestOrderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestOrderBuilder {
    /// Creates a new builder for a `NEW` order owned by alice
    pub fn new() -> Self {
        Self {
            number: OrderNumberFixtures::valid(0),
            owner: UserFixtures::alice(),
            status: OrderStatus::New,
            accrual: AmountFixtures::zero(),
            uploaded_at: TemporalFixtures::first_upload(),
        }
    }

    pub fn with_number(mut self, number: OrderNumber) -> Self {
        self.number = number;
        self
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn uploaded_at(mut self, at: DateTime<Utc>) -> Self {
        self.uploaded_at = at;
        self
    }

    /// Marks the order `PROCESSED` with the given reward
    pub fn processed(mut self, accrual: Decimal) -> Self {
        self.status = OrderStatus::Processed;
        self.accrual = Amount::new(accrual);
        self
    }

    pub fn invalid(self) -> Self {
        self.with_status(OrderStatus::Invalid)
    }

    pub fn build(self) -> Order {
        Order {
            number: self.number,
            owner: self.owner,
            status: self.status,
            accrual: self.accrual,
            uploaded_at: self.uploaded_at,
        }
    }
}

/// Builder for constructing test withdrawals
pub struct TestWithdrawalBuilder {
    order: OrderNumber,
    owner: UserId,
    sum: Amount,
    processed_at: DateTime<Utc>,
}

impl Default for TestWithdrawalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWithdrawalBuilder {
    pub fn new() -> Self {
        Self {
            order: OrderNumberFixtures::valid(3),
            owner: UserFixtures::alice(),
            sum: AmountFixtures::withdraw_100(),
            processed_at: TemporalFixtures::minutes_later(60),
        }
    }

    pub fn with_order(mut self, order: OrderNumber) -> Self {
        self.order = order;
        self
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_sum(mut self, sum: Decimal) -> Self {
        self.sum = Amount::new(sum);
        self
    }

    pub fn processed_at(mut self, at: DateTime<Utc>) -> Self {
        self.processed_at = at;
        self
    }

    pub fn build(self) -> Withdrawal {
        Withdrawal {
            order: self.order,
            owner: self.owner,
            sum: self.sum,
            processed_at: self.processed_at,
        }
    }
}
