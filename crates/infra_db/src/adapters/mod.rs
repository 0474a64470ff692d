//! Domain Adapters
//!
//! Adapter implementations for the loyalty ports, connecting domain
//! interfaces to PostgreSQL.
//!
//! Each adapter:
//! - Implements a domain port trait
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresOrderStore, PostgresUserStore};
//!
//! let orders = PostgresOrderStore::new(pool.clone());
//! let users = PostgresUserStore::new(pool);
//! ```

pub mod loyalty;
pub mod users;

pub use loyalty::PostgresOrderStore;
pub use users::PostgresUserStore;
