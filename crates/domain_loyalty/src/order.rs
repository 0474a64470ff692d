//! Order aggregate and its status state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Amount, UserId};

use crate::accrual::AccrualInfo;
use crate::error::LoyaltyError;
use crate::order_number::OrderNumber;

/// Order status
///
/// ```text
/// NEW ──► PROCESSING ──► PROCESSED
///  │           └───────► INVALID
///  └──────────────────► PROCESSED | INVALID
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Uploaded, not yet picked up by the authority
    New,
    /// The authority is computing the accrual
    Processing,
    /// The authority rejected the order; terminal
    Invalid,
    /// Accrual recorded; terminal
    Processed,
}

impl OrderStatus {
    /// Terminal orders are never polled or modified again
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Processed | OrderStatus::Invalid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Invalid => "INVALID",
            OrderStatus::Processed => "PROCESSED",
        }
    }

    /// Ordering used to refuse backward moves between live states
    fn rank(&self) -> u8 {
        match self {
            OrderStatus::New => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Invalid | OrderStatus::Processed => 2,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(OrderStatus::New),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "INVALID" => Ok(OrderStatus::Invalid),
            "PROCESSED" => Ok(OrderStatus::Processed),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// Result of applying authority information to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed; no write is needed
    Unchanged,
    /// Status (and possibly accrual) moved forward
    Advanced {
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl Transition {
    pub fn is_change(&self) -> bool {
        matches!(self, Transition::Advanced { .. })
    }
}

/// A purchase order uploaded by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Checksum-validated, globally unique number
    pub number: OrderNumber,
    /// Owning user; never changes
    pub owner: UserId,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Points awarded; zero unless `PROCESSED`
    pub accrual: Amount,
    /// Upload time; never changes
    pub uploaded_at: DateTime<Utc>,
}

impl Order {
    /// Creates a freshly uploaded order in state `NEW`
    pub fn new(number: OrderNumber, owner: UserId) -> Self {
        Self {
            number,
            owner,
            status: OrderStatus::New,
            accrual: Amount::ZERO,
            uploaded_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a poll result from the accrual authority
    ///
    /// Non-terminal reports re-confirm the current state and never move an
    /// order backwards; `PROCESSED` records the accrual (absent means zero).
    ///
    /// # Errors
    ///
    /// - `OrderAlreadyFinal` if the order is terminal
    /// - `OrderMismatch` if `info` describes another order
    /// - `InvalidAmount` if the authority reports a negative accrual
    pub fn apply(&mut self, info: &AccrualInfo) -> Result<Transition, LoyaltyError> {
        self.ensure_open()?;

        if info.order != self.number {
            return Err(LoyaltyError::OrderMismatch {
                expected: self.number.to_string(),
                actual: info.order.to_string(),
            });
        }

        let target = info.status.order_status();
        if target.rank() <= self.status.rank() {
            return Ok(Transition::Unchanged);
        }

        if target == OrderStatus::Processed {
            let accrual = info.accrual.unwrap_or(Amount::ZERO);
            if accrual.is_negative() {
                return Err(LoyaltyError::InvalidAmount(format!(
                    "negative accrual {} for order {}",
                    accrual, self.number
                )));
            }
            self.accrual = accrual;
        }

        let from = self.status;
        self.status = target;
        Ok(Transition::Advanced { from, to: target })
    }

    /// Resolves an order the authority could not answer for to `INVALID`
    pub fn invalidate(&mut self) -> Result<Transition, LoyaltyError> {
        self.ensure_open()?;

        let from = self.status;
        self.status = OrderStatus::Invalid;
        self.accrual = Amount::ZERO;
        Ok(Transition::Advanced {
            from,
            to: OrderStatus::Invalid,
        })
    }

    fn ensure_open(&self) -> Result<(), LoyaltyError> {
        if self.is_terminal() {
            return Err(LoyaltyError::OrderAlreadyFinal {
                number: self.number.to_string(),
                status: self.status,
            });
        }
        Ok(())
    }
}
