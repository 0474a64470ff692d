//! Loyalty domain services
//!
//! [`LoyaltyService`] is the entry point request handlers use. It validates
//! input, delegates persistence to the [`OrderStore`] and translates store
//! outcomes into domain errors.

use rust_decimal::Decimal;
use std::sync::Arc;

use core_kernel::UserId;

use crate::error::LoyaltyError;
use crate::ledger::{Balance, Ledger};
use crate::order::Order;
use crate::order_number::OrderNumber;
use crate::ports::{InsertOutcome, OrderStore, WithdrawOutcome};
use crate::withdrawal::Withdrawal;

/// Order upload, withdrawal and balance queries for authenticated users
#[derive(Clone)]
pub struct LoyaltyService {
    store: Arc<dyn OrderStore>,
}

impl LoyaltyService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Registers a new order for `user` in state `NEW`
    ///
    /// # Errors
    ///
    /// - `InvalidOrderNumber` if the checksum fails
    /// - `AlreadyUploadedBySameUser` if `user` uploaded it before
    /// - `AlreadyUploadedByAnotherUser` if someone else owns it
    pub async fn upload_order(&self, user: UserId, raw_number: &str) -> Result<Order, LoyaltyError> {
        let number = OrderNumber::parse(raw_number)?;
        let order = Order::new(number, user);

        match self.store.insert_order(&order).await? {
            InsertOutcome::Inserted => {
                tracing::info!(order = %order.number, %user, "Order uploaded");
                Ok(order)
            }
            InsertOutcome::Conflict => {
                let existing = self.store.get_order(&order.number).await?;
                match existing {
                    Some(existing) if existing.owner == user => {
                        Err(LoyaltyError::AlreadyUploadedBySameUser(order.number.to_string()))
                    }
                    // A conflicting row that vanished cannot happen since
                    // orders are never deleted; treat it as foreign.
                    _ => {
                        tracing::info!(order = %order.number, %user, "Order owned by another user");
                        Err(LoyaltyError::AlreadyUploadedByAnotherUser(order.number.to_string()))
                    }
                }
            }
        }
    }

    /// Lists the user's orders, newest first
    pub async fn list_user_orders(&self, user: UserId) -> Result<Vec<Order>, LoyaltyError> {
        Ok(self.store.list_orders_for_user(user).await?)
    }

    /// Spends `sum` points against the reference `raw_order`
    ///
    /// Balance check and insert run atomically in the store, so concurrent
    /// withdrawals of one user never overdraw.
    ///
    /// # Errors
    ///
    /// - `InvalidOrderNumber` if the reference fails the checksum
    /// - `InvalidAmount` if `sum` is not positive
    /// - `InsufficientFunds` if `sum` exceeds the current balance
    /// - `WithdrawalAlreadyExists` if the reference was used before
    pub async fn withdraw(&self, user: UserId, raw_order: &str, sum: Decimal) -> Result<Balance, LoyaltyError> {
        let order = OrderNumber::parse(raw_order)?;
        let withdrawal = Withdrawal::new(user, order, sum)?;

        match self.store.insert_withdrawal_checked(&withdrawal).await? {
            WithdrawOutcome::Recorded { balance } => {
                tracing::info!(
                    order = %withdrawal.order,
                    %user,
                    sum = %withdrawal.sum,
                    current = %balance.current,
                    "Withdrawal recorded"
                );
                Ok(balance)
            }
            WithdrawOutcome::InsufficientFunds { available } => {
                tracing::info!(%user, requested = %withdrawal.sum, %available, "Withdrawal rejected");
                Err(LoyaltyError::InsufficientFunds {
                    requested: withdrawal.sum,
                    available,
                })
            }
            WithdrawOutcome::DuplicateReference => {
                Err(LoyaltyError::WithdrawalAlreadyExists(withdrawal.order.to_string()))
            }
        }
    }

    /// Lists the user's withdrawals, newest first
    pub async fn list_user_withdrawals(&self, user: UserId) -> Result<Vec<Withdrawal>, LoyaltyError> {
        Ok(self.store.list_withdrawals_for_user(user).await?)
    }

    /// Derives the user's current balance from stored records
    pub async fn get_balance(&self, user: UserId) -> Result<Balance, LoyaltyError> {
        let orders = self.store.list_orders_for_user(user).await?;
        let withdrawals = self.store.list_withdrawals_for_user(user).await?;
        Ledger::from_records(user, &orders, &withdrawals)?.balance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockOrderStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_upload_rejects_bad_checksum() {
        let service = LoyaltyService::new(Arc::new(MockOrderStore::new()));
        let err = service.upload_order(UserId::new(1), "12345").await.unwrap_err();
        assert!(matches!(err, LoyaltyError::InvalidOrderNumber(_)));
    }

    #[tokio::test]
    async fn test_balance_of_new_user_is_zero() {
        let service = LoyaltyService::new(Arc::new(MockOrderStore::new()));
        let balance = service.get_balance(UserId::new(7)).await.unwrap();
        assert!(balance.current.is_zero());
        assert!(balance.withdrawn.is_zero());
    }

    #[tokio::test]
    async fn test_withdraw_without_funds() {
        let service = LoyaltyService::new(Arc::new(MockOrderStore::new()));
        let err = service
            .withdraw(UserId::new(1), "2377225624", dec!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::InsufficientFunds { .. }));
    }
}
