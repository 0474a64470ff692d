//! Order repository implementation
//!
//! Database access for uploaded orders. The `orders.number` primary key is
//! what keeps an order number bound to a single user.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::error::DatabaseError;

/// Order status as stored in the `order_status` enum type
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

/// Database row for an order
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub accrual: Decimal,
    pub uploaded_at: DateTime<Utc>,
}

const ORDER_COLUMNS: &str = "number, user_id, status, accrual, uploaded_at";

/// Repository for the `orders` table
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts an order unless the number is taken
    ///
    /// Returns `false` when another row already holds the number. The
    /// check and the insert are one statement, so concurrent uploads of the
    /// same number cannot both succeed.
    pub async fn insert(&self, row: &OrderRow) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (number, user_id, status, accrual, uploaded_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (number) DO NOTHING
            "#,
        )
        .bind(&row.number)
        .bind(row.user_id)
        .bind(row.status)
        .bind(row.accrual)
        .bind(row.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Retrieves an order by number
    pub async fn get(&self, number: &str) -> Result<Option<OrderRow>, DatabaseError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE number = $1",
            ORDER_COLUMNS
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Lists a user's orders, newest first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<OrderRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC, number DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lists up to `limit` orders still awaiting a final status, oldest first
    pub async fn list_pending(&self, limit: i64) -> Result<Vec<OrderRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {} FROM orders
            WHERE status IN ('NEW', 'PROCESSING')
            ORDER BY uploaded_at ASC, number ASC
            LIMIT $1
            "#,
            ORDER_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Updates status and accrual of a non-terminal order
    ///
    /// Returns `false` when no row was changed, either because the order
    /// does not exist or because it is already terminal.
    pub async fn update_open(
        &self,
        number: &str,
        status: OrderStatus,
        accrual: Decimal,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, accrual = $3
            WHERE number = $1 AND status IN ('NEW', 'PROCESSING')
            "#,
        )
        .bind(number)
        .bind(status)
        .bind(accrual)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Sum of accrual over a user's processed orders
    ///
    /// Runs on the caller's connection so it can share a transaction.
    pub async fn accrued_total(conn: &mut PgConnection, user_id: i64) -> Result<Decimal, DatabaseError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(accrual), 0)
            FROM orders
            WHERE user_id = $1 AND status = 'PROCESSED'
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total)
    }
}
