//! Balance and withdrawal bodies

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use domain_loyalty::{Balance, Withdrawal};

/// Body of `GET /api/user/balance`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub current: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub withdrawn: Decimal,
}

impl From<Balance> for BalanceResponse {
    fn from(balance: Balance) -> Self {
        Self {
            current: balance.current.value(),
            withdrawn: balance.withdrawn.value(),
        }
    }
}

/// Body of `POST /api/user/balance/withdraw`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// Reference order number the points are spent on
    pub order: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
}

/// One entry of `GET /api/user/withdrawals`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalResponse {
    pub order: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(withdrawal: Withdrawal) -> Self {
        Self {
            order: withdrawal.order.to_string(),
            sum: withdrawal.sum.value(),
            processed_at: withdrawal.processed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_withdraw_request_accepts_json_numbers() {
        let request: WithdrawRequest =
            serde_json::from_str(r#"{"order":"2377225624","sum":751}"#).unwrap();
        assert_eq!(request.order, "2377225624");
        assert_eq!(request.sum, dec!(751));

        let request: WithdrawRequest =
            serde_json::from_str(r#"{"order":"2377225624","sum":0.5}"#).unwrap();
        assert_eq!(request.sum, dec!(0.5));
    }

    #[test]
    fn test_balance_serializes_as_numbers() {
        let body = BalanceResponse {
            current: dec!(500.5),
            withdrawn: dec!(42),
        };
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["current"].as_f64(), Some(500.5));
        assert_eq!(json["withdrawn"].as_f64(), Some(42.0));
    }
}
