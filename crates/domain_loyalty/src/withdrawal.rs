//! Withdrawals of accumulated points

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Amount, UserId};

use crate::error::LoyaltyError;
use crate::order_number::OrderNumber;

/// Points spent by a user against a future order
///
/// `order` is a free reference chosen by the user. It is checksum
/// validated but does not have to match an uploaded order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Reference number the points were spent on
    pub order: OrderNumber,
    /// Owning user
    pub owner: UserId,
    /// Points withdrawn; always positive
    pub sum: Amount,
    /// When the withdrawal was recorded
    pub processed_at: DateTime<Utc>,
}

impl Withdrawal {
    /// Creates a withdrawal request stamped with the current time
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` unless `sum` is positive with at most two
    /// fractional digits. Finer sums are rejected rather than rounded.
    pub fn new(owner: UserId, order: OrderNumber, sum: Decimal) -> Result<Self, LoyaltyError> {
        if sum.normalize().scale() > 2 {
            return Err(LoyaltyError::InvalidAmount(format!(
                "{} has more than two decimal places",
                sum
            )));
        }
        let sum = Amount::positive(sum)
            .map_err(|e| LoyaltyError::InvalidAmount(e.to_string()))?;

        Ok(Self {
            order,
            owner,
            sum,
            processed_at: Utc::now(),
        })
    }
}
