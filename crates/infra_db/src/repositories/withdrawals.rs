//! Withdrawal repository implementation
//!
//! Withdrawals are written inside a transaction that first takes a
//! per-user advisory lock, so balance checks of one user never interleave.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::error::DatabaseError;

/// Database row for a withdrawal
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WithdrawalRow {
    pub order_number: String,
    pub user_id: i64,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

/// Repository for the `withdrawals` table
#[derive(Debug, Clone)]
pub struct WithdrawalRepository {
    pool: PgPool,
}

impl WithdrawalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a transaction holding the user's withdrawal lock
    ///
    /// The lock is released when the transaction commits or rolls back.
    pub async fn begin_for_user(&self, user_id: i64) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    /// Whether a withdrawal with this reference exists
    pub async fn exists(conn: &mut PgConnection, order_number: &str) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM withdrawals WHERE order_number = $1)",
        )
        .bind(order_number)
        .fetch_one(&mut *conn)
        .await?;

        Ok(exists)
    }

    /// Sum of a user's withdrawals
    pub async fn withdrawn_total(conn: &mut PgConnection, user_id: i64) -> Result<Decimal, DatabaseError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(sum), 0) FROM withdrawals WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total)
    }

    /// Inserts a withdrawal; returns `false` if the reference is taken
    pub async fn insert(conn: &mut PgConnection, row: &WithdrawalRow) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO withdrawals (order_number, user_id, sum, processed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (order_number) DO NOTHING
            "#,
        )
        .bind(&row.order_number)
        .bind(row.user_id)
        .bind(row.sum)
        .bind(row.processed_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists a user's withdrawals, newest first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<WithdrawalRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, WithdrawalRow>(
            r#"
            SELECT order_number, user_id, sum, processed_at
            FROM withdrawals
            WHERE user_id = $1
            ORDER BY processed_at DESC, order_number DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
