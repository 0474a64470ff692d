//! Accrual authority port
//!
//! The accrual authority is the external system of record that decides how
//! many points an order earns. The domain talks to it only through
//! [`AccrualPort`]; the HTTP implementation lives in
//! [`crate::adapters::accrual_http`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use core_kernel::{Amount, DomainPort};

use crate::order::OrderStatus;
use crate::order_number::OrderNumber;

/// Status reported by the accrual authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualStatus {
    /// Known to the authority, not yet being processed
    Registered,
    /// Being processed
    Processing,
    /// Accrual decided
    Processed,
    /// Rejected, no accrual will be granted
    Invalid,
}

impl AccrualStatus {
    /// Maps the authority status onto the order lifecycle
    pub fn order_status(&self) -> OrderStatus {
        match self {
            AccrualStatus::Registered => OrderStatus::New,
            AccrualStatus::Processing => OrderStatus::Processing,
            AccrualStatus::Processed => OrderStatus::Processed,
            AccrualStatus::Invalid => OrderStatus::Invalid,
        }
    }
}

/// One answer from the accrual authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualInfo {
    pub order: OrderNumber,
    pub status: AccrualStatus,
    /// Present only once the order is processed
    pub accrual: Option<Amount>,
}

/// Failures when querying the accrual authority
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccrualError {
    /// The authority does not know this order (yet)
    #[error("Order is not registered in the accrual system")]
    OrderNotRegistered,

    /// The authority asks callers to back off
    #[error("Rate limited: retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Any other non-success status code
    #[error("Unexpected response status {status}")]
    UnexpectedResponse { status: u16 },

    /// Connection failure or timeout
    #[error("Transport error: {0}")]
    Transport(String),

    /// Body could not be decoded
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl AccrualError {
    /// Failures worth an immediate retry with backoff
    ///
    /// `OrderNotRegistered` is a soft miss retried on a later cycle and
    /// `RateLimited` pauses all polling, so neither is transient here.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AccrualError::UnexpectedResponse { .. }
                | AccrualError::Transport(_)
                | AccrualError::Decode(_)
        )
    }
}

/// Port to the accrual authority
#[async_trait]
pub trait AccrualPort: DomainPort {
    /// Fetches the authority's current view of an order
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<AccrualInfo, AccrualError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AccrualStatus::Registered.order_status(), OrderStatus::New);
        assert_eq!(AccrualStatus::Processing.order_status(), OrderStatus::Processing);
        assert_eq!(AccrualStatus::Processed.order_status(), OrderStatus::Processed);
        assert_eq!(AccrualStatus::Invalid.order_status(), OrderStatus::Invalid);
    }

    #[test]
    fn test_status_wire_names() {
        let status: AccrualStatus = serde_json::from_str("\"REGISTERED\"").unwrap();
        assert_eq!(status, AccrualStatus::Registered);
    }

    #[test]
    fn test_transient_classification() {
        assert!(AccrualError::Transport("timeout".into()).is_transient());
        assert!(AccrualError::UnexpectedResponse { status: 500 }.is_transient());
        assert!(!AccrualError::OrderNotRegistered.is_transient());
        assert!(!AccrualError::RateLimited {
            retry_after: Duration::from_secs(30)
        }
        .is_transient());
    }
}
