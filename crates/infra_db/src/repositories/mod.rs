//! Repository implementations for the loyalty tables
//!
//! Repositories encapsulate SQL and map between database rows and plain
//! row types; they know nothing about domain rules.
//!
//! # Architecture
//!
//! - Runtime-checked queries with `sqlx::query_as` and `FromRow` rows
//! - Uniqueness enforced by the schema and reported as a boolean outcome
//! - Functions taking `&mut PgConnection` run inside a caller's transaction

pub mod orders;
pub mod withdrawals;
pub mod users;

pub use orders::{OrderRepository, OrderRow};
pub use withdrawals::{WithdrawalRepository, WithdrawalRow};
pub use users::{UserRepository, UserRow};
