//! Points ledger
//!
//! The ledger holds no mutable state of its own. Every balance is derived
//! from the stored orders and withdrawals of one user:
//!
//! ```text
//! withdrawn = Σ withdrawal.sum
//! current   = Σ accrual of PROCESSED orders − withdrawn
//! ```
//!
//! A negative `current` can only come from inconsistent data (the withdraw
//! path authorizes against this same formula), so it is reported as an
//! error instead of being clamped to zero.

use serde::{Deserialize, Serialize};

use core_kernel::{Amount, UserId};

use crate::error::LoyaltyError;
use crate::order::{Order, OrderStatus};
use crate::withdrawal::Withdrawal;

/// A user's spendable and spent points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Points available for withdrawal
    pub current: Amount,
    /// Points withdrawn so far
    pub withdrawn: Amount,
}

/// Accrued and withdrawn totals for one user
///
/// # Invariants
///
/// - Only `PROCESSED` orders contribute to `accrued`
/// - Records owned by other users are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ledger {
    owner: UserId,
    accrued: Amount,
    withdrawn: Amount,
}

impl Ledger {
    /// Derives the ledger from a user's stored records
    pub fn from_records(
        owner: UserId,
        orders: &[Order],
        withdrawals: &[Withdrawal],
    ) -> Result<Self, LoyaltyError> {
        let accrued = Amount::try_sum(
            orders
                .iter()
                .filter(|o| o.owner == owner && o.status == OrderStatus::Processed)
                .map(|o| &o.accrual),
        )?;
        let withdrawn = Amount::try_sum(
            withdrawals
                .iter()
                .filter(|w| w.owner == owner)
                .map(|w| &w.sum),
        )?;

        Ok(Self::from_totals(owner, accrued, withdrawn))
    }

    /// Builds the ledger from totals aggregated by the store
    pub fn from_totals(owner: UserId, accrued: Amount, withdrawn: Amount) -> Self {
        Self {
            owner,
            accrued,
            withdrawn,
        }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn accrued(&self) -> Amount {
        self.accrued
    }

    /// Computes the current balance
    ///
    /// # Errors
    ///
    /// Returns `LedgerInconsistency` if withdrawals exceed accruals.
    pub fn balance(&self) -> Result<Balance, LoyaltyError> {
        let current = self.accrued.checked_sub(&self.withdrawn)?;
        if current.is_negative() {
            tracing::error!(
                user = %self.owner,
                accrued = %self.accrued,
                withdrawn = %self.withdrawn,
                "Derived balance is negative"
            );
            return Err(LoyaltyError::LedgerInconsistency {
                user: self.owner,
                current,
            });
        }

        Ok(Balance {
            current,
            withdrawn: self.withdrawn,
        })
    }

    /// Checks that `sum` can be withdrawn and returns the balance after it
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `sum` is not positive
    /// - `InsufficientFunds` if `sum` exceeds the current balance
    /// - `LedgerInconsistency` if the balance is already negative
    pub fn authorize(&self, sum: Amount) -> Result<Balance, LoyaltyError> {
        if !sum.is_positive() {
            return Err(LoyaltyError::InvalidAmount(format!(
                "withdrawal sum {} must be positive",
                sum
            )));
        }

        let before = self.balance()?;
        if sum > before.current {
            return Err(LoyaltyError::InsufficientFunds {
                requested: sum,
                available: before.current,
            });
        }

        Ok(Balance {
            current: before.current.checked_sub(&sum)?,
            withdrawn: before.withdrawn.checked_add(&sum)?,
        })
    }
}
