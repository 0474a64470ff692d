//! Accrual reconciliation
//!
//! The [`ReconciliationEngine`] brings stored orders in line with the
//! accrual authority. One cycle:
//!
//! 1. selects up to `batch_size` non-terminal orders, oldest first;
//! 2. polls the authority for each, retrying transient failures with a
//!    linear backoff and marking the order `INVALID` once attempts run out;
//! 3. applies the reported status and persists changed orders.
//!
//! A `429` from the authority installs a pause shared by all cycles: the
//! rest of the batch is deferred and no call is made until it expires.
//!
//! The [`ReconciliationScheduler`] drives cycles from a fixed interval and
//! never runs two cycles at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::accrual::{AccrualError, AccrualPort};
use crate::error::LoyaltyError;
use crate::order::{Order, Transition};
use crate::ports::OrderStore;

/// Tuning for the reconciliation loop
#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    /// Time between cycle starts
    pub interval: Duration,
    /// Maximum orders selected per cycle
    pub batch_size: u32,
    /// Calls per order per cycle before it is marked `INVALID`
    pub max_attempts: u32,
    /// Base backoff; the n-th retry waits `n * retry_backoff`
    pub retry_backoff: Duration,
    /// Upper bound on a rate-limit pause
    pub max_pause: Duration,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            batch_size: 100,
            max_attempts: 3,
            retry_backoff: Duration::from_secs(1),
            max_pause: Duration::from_secs(3600),
        }
    }
}

impl ReconciliationConfig {
    /// Sets the cycle period; a zero period is raised to one millisecond
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn with_max_pause(mut self, max_pause: Duration) -> Self {
        self.max_pause = max_pause;
        self
    }

    /// Wait before retry number `attempt`, or the base backoff on overflow
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff
            .checked_mul(attempt)
            .unwrap_or(self.retry_backoff)
    }
}

/// Counters for one reconciliation cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Orders selected as pending
    pub selected: usize,
    /// Orders whose status moved forward and was persisted
    pub updated: usize,
    /// Orders the authority reported without a change, or does not know yet
    pub unchanged: usize,
    /// Orders marked `INVALID` after exhausting retries
    pub invalidated: usize,
    /// Orders skipped because of a rate-limit pause or shutdown
    pub deferred: usize,
    /// Orders left pending because of a persistence or data error
    pub failed: usize,
}

/// What happened to a single order within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderOutcome {
    Updated,
    Unchanged,
    Invalidated,
    Deferred,
    Failed,
}

impl CycleReport {
    fn record(&mut self, outcome: OrderOutcome) {
        match outcome {
            OrderOutcome::Updated => self.updated += 1,
            OrderOutcome::Unchanged => self.unchanged += 1,
            OrderOutcome::Invalidated => self.invalidated += 1,
            OrderOutcome::Deferred => self.deferred += 1,
            OrderOutcome::Failed => self.failed += 1,
        }
    }
}

/// Polls the accrual authority and advances pending orders
pub struct ReconciliationEngine {
    store: Arc<dyn OrderStore>,
    accrual: Arc<dyn AccrualPort>,
    config: ReconciliationConfig,
    paused_until: RwLock<Option<Instant>>,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<dyn OrderStore>,
        accrual: Arc<dyn AccrualPort>,
        config: ReconciliationConfig,
    ) -> Self {
        Self {
            store,
            accrual,
            config,
            paused_until: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// Remaining rate-limit pause, if one is active
    pub async fn paused_for(&self) -> Option<Duration> {
        let until = (*self.paused_until.read().await)?;
        let now = Instant::now();
        (until > now).then(|| until - now)
    }

    async fn pause(&self, retry_after: Duration) {
        let now = Instant::now();
        let until = now
            .checked_add(retry_after.min(self.config.max_pause))
            .or_else(|| now.checked_add(self.config.max_pause))
            .unwrap_or(now);
        let mut paused = self.paused_until.write().await;
        // Never shorten a pause that is already longer
        if paused.map_or(true, |current| current < until) {
            *paused = Some(until);
        }
    }

    /// Runs one reconciliation cycle
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyError::Port` if pending orders cannot be selected.
    /// Per-order failures are counted in the report instead.
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> Result<CycleReport, LoyaltyError> {
        let pending = self
            .store
            .list_orders_pending_reconciliation(self.config.batch_size)
            .await?;

        let mut report = CycleReport {
            selected: pending.len(),
            ..Default::default()
        };

        let total = pending.len();
        for (index, order) in pending.into_iter().enumerate() {
            if shutdown.is_cancelled() {
                report.deferred += total - index;
                tracing::info!(deferred = total - index, "Reconciliation cycle cancelled");
                break;
            }

            if let Some(remaining) = self.paused_for().await {
                report.deferred += total - index;
                tracing::info!(
                    deferred = total - index,
                    retry_after_secs = remaining.as_secs(),
                    "Accrual polling paused by rate limit"
                );
                break;
            }

            let outcome = self.reconcile_order(order, shutdown).await;
            report.record(outcome);
        }

        if report.selected > 0 {
            tracing::info!(
                selected = report.selected,
                updated = report.updated,
                unchanged = report.unchanged,
                invalidated = report.invalidated,
                deferred = report.deferred,
                failed = report.failed,
                "Reconciliation cycle finished"
            );
        }

        Ok(report)
    }

    async fn reconcile_order(&self, mut order: Order, shutdown: &CancellationToken) -> OrderOutcome {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.accrual.fetch_accrual(&order.number).await {
                Ok(info) => {
                    return match order.apply(&info) {
                        Ok(Transition::Unchanged) => OrderOutcome::Unchanged,
                        Ok(Transition::Advanced { from, to }) => {
                            tracing::info!(order = %order.number, %from, %to, accrual = %order.accrual, "Order advanced");
                            self.persist(&order, OrderOutcome::Updated).await
                        }
                        Err(e) => {
                            tracing::warn!(order = %order.number, error = %e, "Rejected accrual response");
                            OrderOutcome::Failed
                        }
                    };
                }
                Err(AccrualError::OrderNotRegistered) => {
                    tracing::debug!(order = %order.number, "Order not yet registered in accrual system");
                    return OrderOutcome::Unchanged;
                }
                Err(AccrualError::RateLimited { retry_after }) => {
                    self.pause(retry_after).await;
                    tracing::warn!(
                        order = %order.number,
                        retry_after_secs = retry_after.as_secs(),
                        "Accrual system rate limit, pausing"
                    );
                    return OrderOutcome::Deferred;
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let backoff = self.config.backoff(attempt);
                    tracing::warn!(
                        order = %order.number,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Accrual call failed, retrying"
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => return OrderOutcome::Deferred,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(order = %order.number, attempt, error = %e, "Accrual retries exhausted");
                    break;
                }
            }
        }

        match order.invalidate() {
            Ok(_) => self.persist(&order, OrderOutcome::Invalidated).await,
            Err(e) => {
                tracing::warn!(order = %order.number, error = %e, "Cannot invalidate order");
                OrderOutcome::Failed
            }
        }
    }

    async fn persist(&self, order: &Order, outcome: OrderOutcome) -> OrderOutcome {
        match self.store.update_order(order).await {
            Ok(()) => outcome,
            Err(e) => {
                tracing::error!(
                    order = %order.number,
                    status = %order.status,
                    error = %e,
                    "Failed to persist order, leaving it for the next cycle"
                );
                OrderOutcome::Failed
            }
        }
    }
}

/// Clears the in-flight flag when a cycle task ends, even on panic
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs reconciliation cycles on a fixed interval
///
/// A tick that finds the previous cycle still running is skipped, so at
/// most one cycle is in flight at any time.
pub struct ReconciliationScheduler {
    engine: Arc<ReconciliationEngine>,
    shutdown: CancellationToken,
    in_flight: Arc<AtomicBool>,
}

impl ReconciliationScheduler {
    pub fn new(engine: Arc<ReconciliationEngine>, shutdown: CancellationToken) -> Self {
        Self {
            engine,
            shutdown,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a cycle is currently running
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stops the loop; the in-flight cycle winds down at its next check
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Starts the timer loop
    ///
    /// The returned handle completes after shutdown once the in-flight
    /// cycle, if any, has finished.
    pub fn spawn(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let shutdown = self.shutdown.clone();
        let in_flight = self.in_flight.clone();
        let period = engine.config().interval;

        tokio::spawn(async move {
            tracing::info!(interval_secs = period.as_secs(), "Reconciliation scheduler started");

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut current: Option<JoinHandle<()>> = None;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if in_flight
                            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                            .is_err()
                        {
                            tracing::debug!("Previous reconciliation cycle still running, skipping tick");
                            continue;
                        }

                        let guard = InFlightGuard(in_flight.clone());
                        let engine = engine.clone();
                        let token = shutdown.clone();
                        current = Some(tokio::spawn(async move {
                            let _guard = guard;
                            if let Err(e) = engine.run_cycle(&token).await {
                                tracing::error!(error = %e, "Reconciliation cycle failed");
                            }
                        }));
                    }
                }
            }

            if let Some(handle) = current {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Reconciliation task aborted");
                }
            }
            tracing::info!("Reconciliation scheduler stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ReconciliationConfig::default();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_backoff, Duration::from_secs(1));
        assert_eq!(config.max_pause, Duration::from_secs(3600));
    }

    #[test]
    fn test_backoff_grows_linearly() {
        let config = ReconciliationConfig::default().with_retry_backoff(Duration::from_millis(250));
        assert_eq!(config.backoff(1), Duration::from_millis(250));
        assert_eq!(config.backoff(3), Duration::from_millis(750));
    }

    #[test]
    fn test_backoff_overflow_falls_back_to_base() {
        let huge = Duration::from_secs(u64::MAX / 2 + 1);
        let config = ReconciliationConfig::default().with_retry_backoff(huge);
        assert_eq!(config.backoff(1), huge);
        assert_eq!(config.backoff(2), huge);
    }

    #[test]
    fn test_max_attempts_floor() {
        let config = ReconciliationConfig::default().with_max_attempts(0);
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn test_report_record() {
        let mut report = CycleReport::default();
        report.record(OrderOutcome::Updated);
        report.record(OrderOutcome::Deferred);
        report.record(OrderOutcome::Deferred);
        assert_eq!(report.updated, 1);
        assert_eq!(report.deferred, 2);
    }
}
