//! PostgreSQL Order Store Adapter
//!
//! This module provides the database adapter for the loyalty domain,
//! implementing the `OrderStore` port on top of the order and withdrawal
//! repositories.
//!
//! # Withdrawal atomicity
//!
//! `insert_withdrawal_checked` runs in one transaction:
//!
//! 1. `pg_advisory_xact_lock(user_id)` serializes the user's withdrawals
//! 2. the duplicate reference check and both totals are read
//! 3. the domain ledger authorizes the sum
//! 4. the row is inserted and the transaction commits
//!
//! A rejected withdrawal rolls back and releases the lock.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresOrderStore;
//! use domain_loyalty::OrderStore;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn OrderStore> = Arc::new(PostgresOrderStore::new(pool));
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, Amount, DomainPort, HealthCheckResult, HealthCheckable, PortError, UserId,
};
use domain_loyalty::{
    InsertOutcome, Ledger, LoyaltyError, Order, OrderNumber, OrderStatus, OrderStore,
    WithdrawOutcome, Withdrawal,
};

use crate::error::db_to_port_error;
use crate::repositories::orders::{OrderRepository, OrderRow, OrderStatus as DbOrderStatus};
use crate::repositories::withdrawals::{WithdrawalRepository, WithdrawalRow};

/// PostgreSQL-backed implementation of the OrderStore port
///
/// # Error Handling
///
/// Database errors are translated to `PortError` variants:
/// - unique violations -> `PortError::Conflict`
/// - connection and pool failures -> `PortError::Connection`
/// - rows that do not map to domain values -> `PortError::Transformation`
/// - anything else -> `PortError::Internal`
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    orders: OrderRepository,
    withdrawals: WithdrawalRepository,
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            withdrawals: WithdrawalRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns the underlying order repository
    pub fn orders(&self) -> &OrderRepository {
        &self.orders
    }
}

impl DomainPort for PostgresOrderStore {}

#[async_trait]
impl HealthCheckable for PostgresOrderStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-order-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-order-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(skip(self, order), fields(order = %order.number, user = %order.owner))]
    async fn insert_order(&self, order: &Order) -> Result<InsertOutcome, PortError> {
        let inserted = self
            .orders
            .insert(&order_to_row(order))
            .await
            .map_err(db_to_port_error)?;

        if inserted {
            Ok(InsertOutcome::Inserted)
        } else {
            debug!("Order number already taken");
            Ok(InsertOutcome::Conflict)
        }
    }

    #[instrument(skip(self), fields(order = %number))]
    async fn get_order(&self, number: &OrderNumber) -> Result<Option<Order>, PortError> {
        self.orders
            .get(number.as_str())
            .await
            .map_err(db_to_port_error)?
            .map(row_to_order)
            .transpose()
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>, PortError> {
        self.orders
            .list_for_user(user.get())
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_order)
            .collect()
    }

    #[instrument(skip(self, order), fields(order = %order.number, status = %order.status))]
    async fn update_order(&self, order: &Order) -> Result<(), PortError> {
        let updated = self
            .orders
            .update_open(
                order.number.as_str(),
                domain_to_db_status(order.status),
                order.accrual.value(),
            )
            .await
            .map_err(db_to_port_error)?;

        if updated {
            return Ok(());
        }

        match self.orders.get(order.number.as_str()).await.map_err(db_to_port_error)? {
            None => Err(PortError::not_found("Order", &order.number)),
            Some(row) => Err(PortError::conflict(format!(
                "order {} is already {:?}",
                row.number, row.status
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn list_orders_pending_reconciliation(&self, limit: u32) -> Result<Vec<Order>, PortError> {
        self.orders
            .list_pending(i64::from(limit))
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_order)
            .collect()
    }

    #[instrument(skip(self, withdrawal), fields(order = %withdrawal.order, user = %withdrawal.owner))]
    async fn insert_withdrawal_checked(&self, withdrawal: &Withdrawal) -> Result<WithdrawOutcome, PortError> {
        let user_id = withdrawal.owner.get();
        let mut tx = self
            .withdrawals
            .begin_for_user(user_id)
            .await
            .map_err(db_to_port_error)?;

        if WithdrawalRepository::exists(&mut *tx, withdrawal.order.as_str())
            .await
            .map_err(db_to_port_error)?
        {
            debug!("Withdrawal reference already used");
            return Ok(WithdrawOutcome::DuplicateReference);
        }

        let accrued = OrderRepository::accrued_total(&mut *tx, user_id)
            .await
            .map_err(db_to_port_error)?;
        let withdrawn = WithdrawalRepository::withdrawn_total(&mut *tx, user_id)
            .await
            .map_err(db_to_port_error)?;

        let ledger = Ledger::from_totals(withdrawal.owner, Amount::new(accrued), Amount::new(withdrawn));
        let balance = match ledger.authorize(withdrawal.sum) {
            Ok(balance) => balance,
            Err(LoyaltyError::InsufficientFunds { available, .. }) => {
                debug!(%available, "Insufficient funds");
                return Ok(WithdrawOutcome::InsufficientFunds { available });
            }
            Err(e) => return Err(PortError::internal(e.to_string())),
        };

        // The advisory lock is per user; another user's concurrent insert of
        // the same reference surfaces here.
        let inserted = WithdrawalRepository::insert(&mut *tx, &withdrawal_to_row(withdrawal))
            .await
            .map_err(db_to_port_error)?;
        if !inserted {
            return Ok(WithdrawOutcome::DuplicateReference);
        }

        tx.commit()
            .await
            .map_err(|e| db_to_port_error(e.into()))?;

        Ok(WithdrawOutcome::Recorded { balance })
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn list_withdrawals_for_user(&self, user: UserId) -> Result<Vec<Withdrawal>, PortError> {
        self.withdrawals
            .list_for_user(user.get())
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_withdrawal)
            .collect()
    }
}

// ============================================================================
// Conversion Functions
// ============================================================================

fn domain_to_db_status(status: OrderStatus) -> DbOrderStatus {
    match status {
        OrderStatus::New => DbOrderStatus::New,
        OrderStatus::Processing => DbOrderStatus::Processing,
        OrderStatus::Invalid => DbOrderStatus::Invalid,
        OrderStatus::Processed => DbOrderStatus::Processed,
    }
}

fn db_to_domain_status(status: DbOrderStatus) -> OrderStatus {
    match status {
        DbOrderStatus::New => OrderStatus::New,
        DbOrderStatus::Processing => OrderStatus::Processing,
        DbOrderStatus::Invalid => OrderStatus::Invalid,
        DbOrderStatus::Processed => OrderStatus::Processed,
    }
}

fn parse_number(raw: String) -> Result<OrderNumber, PortError> {
    OrderNumber::parse(raw).map_err(|e| PortError::transformation(e.to_string()))
}

fn order_to_row(order: &Order) -> OrderRow {
    OrderRow {
        number: order.number.to_string(),
        user_id: order.owner.get(),
        status: domain_to_db_status(order.status),
        accrual: order.accrual.value(),
        uploaded_at: order.uploaded_at,
    }
}

fn row_to_order(row: OrderRow) -> Result<Order, PortError> {
    Ok(Order {
        number: parse_number(row.number)?,
        owner: UserId::new(row.user_id),
        status: db_to_domain_status(row.status),
        accrual: Amount::new(row.accrual),
        uploaded_at: row.uploaded_at,
    })
}

fn withdrawal_to_row(withdrawal: &Withdrawal) -> WithdrawalRow {
    WithdrawalRow {
        order_number: withdrawal.order.to_string(),
        user_id: withdrawal.owner.get(),
        sum: withdrawal.sum.value(),
        processed_at: withdrawal.processed_at,
    }
}

fn row_to_withdrawal(row: WithdrawalRow) -> Result<Withdrawal, PortError> {
    Ok(Withdrawal {
        order: parse_number(row.order_number)?,
        owner: UserId::new(row.user_id),
        sum: Amount::new(row.sum),
        processed_at: row.processed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_conversion_is_bijective() {
        for status in [
            OrderStatus::New,
            OrderStatus::Processing,
            OrderStatus::Invalid,
            OrderStatus::Processed,
        ] {
            assert_eq!(db_to_domain_status(domain_to_db_status(status)), status);
        }
    }

    #[test]
    fn test_order_row_conversion() {
        let mut order = Order::new(OrderNumber::parse("79927398713").unwrap(), UserId::new(42));
        order.status = OrderStatus::Processed;
        order.accrual = Amount::new(dec!(729.98));

        let row = order_to_row(&order);
        assert_eq!(row.user_id, 42);
        assert_eq!(row.accrual, dec!(729.98));
        assert_eq!(row_to_order(row).unwrap(), order);
    }

    #[test]
    fn test_corrupt_number_is_transformation_error() {
        let row = OrderRow {
            number: "12345".to_string(),
            user_id: 1,
            status: DbOrderStatus::New,
            accrual: dec!(0),
            uploaded_at: Utc::now(),
        };
        assert!(matches!(
            row_to_order(row),
            Err(PortError::Transformation { .. })
        ));
    }
}
