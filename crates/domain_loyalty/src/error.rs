//! Loyalty domain errors

use thiserror::Error;

use core_kernel::{Amount, MoneyError, PortError, UserId};

use crate::order::OrderStatus;

/// Errors that can occur in the loyalty domain
#[derive(Debug, Error)]
pub enum LoyaltyError {
    /// Order number failed the checksum or contains non-digits
    #[error("Invalid order number: {0:?}")]
    InvalidOrderNumber(String),

    /// Amount is zero, negative or not representable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The same user uploaded this order before
    #[error("Order {0} already uploaded by this user")]
    AlreadyUploadedBySameUser(String),

    /// Another user owns this order number
    #[error("Order {0} already uploaded by another user")]
    AlreadyUploadedByAnotherUser(String),

    /// Withdrawal exceeds the current balance
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Amount,
        available: Amount,
    },

    /// A withdrawal against this reference was already recorded
    #[error("Withdrawal for order {0} already exists")]
    WithdrawalAlreadyExists(String),

    /// Terminal orders never change again
    #[error("Order {number} is already final ({status})")]
    OrderAlreadyFinal {
        number: String,
        status: OrderStatus,
    },

    /// Accrual information was applied to the wrong order
    #[error("Accrual for order {actual} applied to order {expected}")]
    OrderMismatch {
        expected: String,
        actual: String,
    },

    /// Derived balance went negative; the stored data is inconsistent
    #[error("Ledger inconsistency for {user}: current balance {current}")]
    LedgerInconsistency {
        user: UserId,
        current: Amount,
    },

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Store error: {0}")]
    Port(#[from] PortError),
}

impl LoyaltyError {
    /// Malformed input, rejected immediately and never retried
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LoyaltyError::InvalidOrderNumber(_)
                | LoyaltyError::InvalidAmount(_)
                | LoyaltyError::Money(MoneyError::InvalidAmount(_))
        )
    }

    /// Rejected because of existing data; surfaced to the caller
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            LoyaltyError::AlreadyUploadedBySameUser(_)
                | LoyaltyError::AlreadyUploadedByAnotherUser(_)
                | LoyaltyError::InsufficientFunds { .. }
                | LoyaltyError::WithdrawalAlreadyExists(_)
        )
    }
}
