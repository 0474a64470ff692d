//! Loyalty Domain - Order Lifecycle and Points Ledger
//!
//! This crate implements the core of the loyalty backend: users upload
//! purchase-order numbers, an external accrual authority decides the reward
//! for each order, and users withdraw accumulated points.
//!
//! # Order Lifecycle
//!
//! ```text
//! NEW -> PROCESSING -> PROCESSED | INVALID
//! ```
//!
//! Orders are created `NEW` on upload and only ever advanced by the
//! [`ReconciliationEngine`], which polls the authority through the
//! [`AccrualPort`]. `PROCESSED` and `INVALID` are terminal.
//!
//! # Ledger
//!
//! The spendable balance is never stored. It is derived on demand from the
//! accrual of `PROCESSED` orders minus all withdrawals, and withdrawals are
//! authorized against that derived balance atomically at the store.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_loyalty::{LoyaltyService, ReconciliationEngine, ReconciliationConfig};
//!
//! let service = LoyaltyService::new(store.clone());
//! service.upload_order(user, "4561261212345467").await?;
//!
//! let engine = ReconciliationEngine::new(store, accrual, ReconciliationConfig::default());
//! let report = engine.run_cycle(&shutdown).await?;
//! ```

pub mod order_number;
pub mod order;
pub mod withdrawal;
pub mod ledger;
pub mod accrual;
pub mod ports;
pub mod adapters;
pub mod service;
pub mod reconciliation;
pub mod error;

pub use order_number::OrderNumber;
pub use order::{Order, OrderStatus, Transition};
pub use withdrawal::Withdrawal;
pub use ledger::{Balance, Ledger};
pub use accrual::{AccrualError, AccrualInfo, AccrualPort, AccrualStatus};
pub use ports::{InsertOutcome, OrderStore, UserPort, UserRecord, WithdrawOutcome};
pub use adapters::{AccrualClientConfig, HttpAccrualClient};
pub use service::LoyaltyService;
pub use reconciliation::{CycleReport, ReconciliationConfig, ReconciliationEngine, ReconciliationScheduler};
pub use error::LoyaltyError;
