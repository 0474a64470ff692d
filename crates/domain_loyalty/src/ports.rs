//! Loyalty Domain Ports
//!
//! Port interfaces the loyalty domain needs from its persistence layer.
//!
//! - [`OrderStore`]: orders and withdrawals. The PostgreSQL adapter lives in
//!   `infra_db`; [`mock::MockOrderStore`] keeps everything in memory.
//! - [`UserPort`]: credential records owned by the authentication layer.
//!
//! # Atomicity
//!
//! Two operations carry concurrency guarantees the domain relies on:
//!
//! - `insert_order` reports a duplicate number as [`InsertOutcome::Conflict`]
//!   instead of failing; the unique key on the number is the source of truth.
//! - `insert_withdrawal_checked` recomputes the balance and inserts in one
//!   atomic unit serialized per user, so concurrent withdrawals cannot both
//!   pass the check against a stale balance.
//!
//! ```rust,ignore
//! let store: Arc<dyn OrderStore> = Arc::new(PostgresOrderStore::new(pool));
//! let service = LoyaltyService::new(store);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{Amount, DomainPort, PortError, UserId};

use crate::ledger::Balance;
use crate::order::Order;
use crate::order_number::OrderNumber;
use crate::withdrawal::Withdrawal;

/// Result of inserting an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An order with this number already exists
    Conflict,
}

/// Result of an atomic balance check plus withdrawal insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawOutcome {
    /// Recorded; `balance` is the balance after the withdrawal
    Recorded { balance: Balance },
    /// Nothing recorded; the balance did not cover the sum
    InsufficientFunds { available: Amount },
    /// Nothing recorded; a withdrawal with this reference exists
    DuplicateReference,
}

/// Persistence contract for orders and withdrawals
#[async_trait]
pub trait OrderStore: DomainPort {
    /// Inserts a new order, reporting a duplicate number as `Conflict`
    async fn insert_order(&self, order: &Order) -> Result<InsertOutcome, PortError>;

    /// Looks up an order by number
    async fn get_order(&self, number: &OrderNumber) -> Result<Option<Order>, PortError>;

    /// Lists a user's orders, newest first
    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>, PortError>;

    /// Persists status and accrual of a non-terminal order
    ///
    /// Never rewrites a stored terminal order: that case returns
    /// `PortError::Conflict`, and a missing order returns `NotFound`.
    async fn update_order(&self, order: &Order) -> Result<(), PortError>;

    /// Lists up to `limit` non-terminal orders, oldest upload first
    async fn list_orders_pending_reconciliation(&self, limit: u32) -> Result<Vec<Order>, PortError>;

    /// Checks the owner's balance and records the withdrawal atomically
    async fn insert_withdrawal_checked(&self, withdrawal: &Withdrawal) -> Result<WithdrawOutcome, PortError>;

    /// Lists a user's withdrawals, newest first
    async fn list_withdrawals_for_user(&self, user: UserId) -> Result<Vec<Withdrawal>, PortError>;
}

/// Stored credentials of a registered user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence contract for user credentials
#[async_trait]
pub trait UserPort: DomainPort {
    /// Creates a user; returns `None` when the login is taken
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<Option<UserRecord>, PortError>;

    /// Looks up a user by login
    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, PortError>;
}

/// In-memory implementations of the loyalty ports for testing
///
/// The mocks honour the same atomicity rules as the PostgreSQL adapters:
/// every operation runs under a single write lock.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::RwLock;
    use tokio::time::Instant;

    use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};

    use crate::accrual::{AccrualError, AccrualInfo, AccrualPort};
    use crate::ledger::Ledger;

    #[derive(Debug, Default)]
    struct StoreState {
        orders: HashMap<OrderNumber, Order>,
        withdrawals: Vec<Withdrawal>,
        failing_updates: HashSet<OrderNumber>,
        fail_pending_listing: bool,
    }

    /// In-memory mock implementation of OrderStore
    #[derive(Debug, Default, Clone)]
    pub struct MockOrderStore {
        state: Arc<RwLock<StoreState>>,
        update_calls: Arc<AtomicUsize>,
    }

    impl MockOrderStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with orders, bypassing uniqueness checks
        pub async fn with_orders(orders: Vec<Order>) -> Self {
            let store = Self::new();
            {
                let mut state = store.state.write().await;
                for order in orders {
                    state.orders.insert(order.number.clone(), order);
                }
            }
            store
        }

        /// Makes every `update_order` for `number` fail with a connection error
        pub async fn fail_updates_for(&self, number: &OrderNumber) {
            self.state.write().await.failing_updates.insert(number.clone());
        }

        /// Makes `list_orders_pending_reconciliation` fail
        pub async fn fail_pending_listing(&self, fail: bool) {
            self.state.write().await.fail_pending_listing = fail;
        }

        /// Returns the stored copy of an order
        pub async fn order(&self, number: &OrderNumber) -> Option<Order> {
            self.state.read().await.orders.get(number).cloned()
        }

        /// Number of `update_order` calls, including failed ones
        pub fn update_calls(&self) -> usize {
            self.update_calls.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for MockOrderStore {}

    #[async_trait]
    impl HealthCheckable for MockOrderStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-order-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl OrderStore for MockOrderStore {
        async fn insert_order(&self, order: &Order) -> Result<InsertOutcome, PortError> {
            let mut state = self.state.write().await;
            if state.orders.contains_key(&order.number) {
                return Ok(InsertOutcome::Conflict);
            }
            state.orders.insert(order.number.clone(), order.clone());
            Ok(InsertOutcome::Inserted)
        }

        async fn get_order(&self, number: &OrderNumber) -> Result<Option<Order>, PortError> {
            Ok(self.state.read().await.orders.get(number).cloned())
        }

        async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>, PortError> {
            let state = self.state.read().await;
            let mut orders: Vec<_> = state
                .orders
                .values()
                .filter(|o| o.owner == user)
                .cloned()
                .collect();
            orders.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
            Ok(orders)
        }

        async fn update_order(&self, order: &Order) -> Result<(), PortError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.write().await;
            if state.failing_updates.contains(&order.number) {
                return Err(PortError::connection("injected update failure"));
            }
            let stored = state
                .orders
                .get_mut(&order.number)
                .ok_or_else(|| PortError::not_found("Order", &order.number))?;
            if stored.is_terminal() {
                return Err(PortError::conflict(format!(
                    "order {} is already {}",
                    stored.number, stored.status
                )));
            }
            stored.status = order.status;
            stored.accrual = order.accrual;
            Ok(())
        }

        async fn list_orders_pending_reconciliation(&self, limit: u32) -> Result<Vec<Order>, PortError> {
            let state = self.state.read().await;
            if state.fail_pending_listing {
                return Err(PortError::connection("injected listing failure"));
            }
            let mut pending: Vec<_> = state
                .orders
                .values()
                .filter(|o| !o.is_terminal())
                .cloned()
                .collect();
            pending.sort_by(|a, b| {
                a.uploaded_at
                    .cmp(&b.uploaded_at)
                    .then_with(|| a.number.cmp(&b.number))
            });
            pending.truncate(limit as usize);
            Ok(pending)
        }

        async fn insert_withdrawal_checked(&self, withdrawal: &Withdrawal) -> Result<WithdrawOutcome, PortError> {
            let mut state = self.state.write().await;
            if state.withdrawals.iter().any(|w| w.order == withdrawal.order) {
                return Ok(WithdrawOutcome::DuplicateReference);
            }

            let orders: Vec<_> = state.orders.values().cloned().collect();
            let ledger = Ledger::from_records(withdrawal.owner, &orders, &state.withdrawals)
                .map_err(|e| PortError::internal(e.to_string()))?;

            match ledger.authorize(withdrawal.sum) {
                Ok(balance) => {
                    state.withdrawals.push(withdrawal.clone());
                    Ok(WithdrawOutcome::Recorded { balance })
                }
                Err(crate::LoyaltyError::InsufficientFunds { available, .. }) => {
                    Ok(WithdrawOutcome::InsufficientFunds { available })
                }
                Err(e) => Err(PortError::internal(e.to_string())),
            }
        }

        async fn list_withdrawals_for_user(&self, user: UserId) -> Result<Vec<Withdrawal>, PortError> {
            let state = self.state.read().await;
            let mut withdrawals: Vec<_> = state
                .withdrawals
                .iter()
                .filter(|w| w.owner == user)
                .cloned()
                .collect();
            withdrawals.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
            Ok(withdrawals)
        }
    }

    /// In-memory mock implementation of UserPort
    #[derive(Debug, Default, Clone)]
    pub struct MockUserPort {
        users: Arc<RwLock<Vec<UserRecord>>>,
    }

    impl MockUserPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockUserPort {}

    #[async_trait]
    impl UserPort for MockUserPort {
        async fn create_user(&self, login: &str, password_hash: &str) -> Result<Option<UserRecord>, PortError> {
            let mut users = self.users.write().await;
            if users.iter().any(|u| u.login == login) {
                return Ok(None);
            }
            let record = UserRecord {
                id: UserId::new(users.len() as i64 + 1),
                login: login.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
            };
            users.push(record.clone());
            Ok(Some(record))
        }

        async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, PortError> {
            Ok(self.users.read().await.iter().find(|u| u.login == login).cloned())
        }
    }

    /// A scripted accrual authority
    ///
    /// Responses are queued per order number and consumed in order; once a
    /// queue is empty the fallback response is returned (by default
    /// `OrderNotRegistered`). Every call is recorded with its timestamp.
    #[derive(Debug, Clone)]
    pub struct MockAccrualPort {
        script: Arc<RwLock<HashMap<OrderNumber, VecDeque<Result<AccrualInfo, AccrualError>>>>>,
        fallback: Arc<RwLock<Result<AccrualInfo, AccrualError>>>,
        calls: Arc<RwLock<Vec<(OrderNumber, Instant)>>>,
        latency: Option<Duration>,
    }

    impl Default for MockAccrualPort {
        fn default() -> Self {
            Self {
                script: Arc::default(),
                fallback: Arc::new(RwLock::new(Err(AccrualError::OrderNotRegistered))),
                calls: Arc::default(),
                latency: None,
            }
        }
    }

    impl MockAccrualPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Delays every answer, simulating a slow authority
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        /// Queues a response for `number`
        pub async fn push(&self, number: &OrderNumber, response: Result<AccrualInfo, AccrualError>) {
            self.script
                .write()
                .await
                .entry(number.clone())
                .or_default()
                .push_back(response);
        }

        /// Sets the response used when no scripted answer is queued
        pub async fn set_fallback(&self, response: Result<AccrualInfo, AccrualError>) {
            *self.fallback.write().await = response;
        }

        /// All calls so far, in order
        pub async fn calls(&self) -> Vec<(OrderNumber, Instant)> {
            self.calls.read().await.clone()
        }

        pub async fn call_count(&self) -> usize {
            self.calls.read().await.len()
        }
    }

    impl DomainPort for MockAccrualPort {}

    #[async_trait]
    impl AccrualPort for MockAccrualPort {
        async fn fetch_accrual(&self, number: &OrderNumber) -> Result<AccrualInfo, AccrualError> {
            self.calls.write().await.push((number.clone(), Instant::now()));
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            let scripted = self
                .script
                .write()
                .await
                .get_mut(number)
                .and_then(|queue| queue.pop_front());

            match scripted {
                Some(response) => response,
                None => self.fallback.read().await.clone(),
            }
        }
    }
}
