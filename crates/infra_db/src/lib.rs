//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL persistence for the loyalty backend
//! using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Repositories own the SQL and
//! map rows to plain row types; adapters implement the domain ports on top
//! of the repositories and translate rows into domain types.
//!
//! # Schema
//!
//! - `users`: credentials, login unique
//! - `orders`: one row per uploaded order, number unique across all users
//! - `withdrawals`: one row per withdrawal, keyed by its reference number
//!
//! Balances are not stored. They are summed from `orders` and
//! `withdrawals` whenever needed.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresOrderStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/loyalty")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresOrderStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PostgresOrderStore, PostgresUserStore};
