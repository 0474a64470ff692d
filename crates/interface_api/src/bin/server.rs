//! Loyalty API Server Binary
//!
//! Starts the HTTP API and the background reconciliation task that polls
//! the accrual authority for pending orders.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin loyalty-api
//!
//! # Run with environment variables
//! RUN_ADDRESS=0.0.0.0:8090 DATABASE_URI=postgres://... ACCRUAL_SYSTEM_ADDRESS=http://accrual:8080 cargo run --bin loyalty-api
//! ```
//!
//! # Environment Variables
//!
//! * `LOYALTY_RUN_ADDRESS` / `RUN_ADDRESS` - Listen address (default: localhost:8090)
//! * `LOYALTY_DATABASE_URI` / `DATABASE_URI` - PostgreSQL connection string
//! * `LOYALTY_ACCRUAL_SYSTEM_ADDRESS` / `ACCRUAL_SYSTEM_ADDRESS` - Accrual authority base URL
//! * `LOYALTY_JWT_SECRET` - JWT signing secret (required in production)
//! * `LOYALTY_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `LOYALTY_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `LOYALTY_RECONCILE_INTERVAL_SECS` - Seconds between reconciliation cycles (default: 10)
//! * `LOYALTY_RECONCILE_BATCH_SIZE` - Orders per cycle (default: 100)
//! * `LOYALTY_ACCRUAL_TIMEOUT_SECS` - Accrual request timeout (default: 5)

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_loyalty::{HttpAccrualClient, ReconciliationEngine, ReconciliationScheduler};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresOrderStore, PostgresUserStore};
use interface_api::{config::ApiConfig, create_router, AppState};

/// Main entry point for the API server.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - Database connection or migrations fail
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        run_address = %config.run_address,
        accrual = %config.accrual_system_address,
        "Starting Loyalty API Server"
    );

    let pool = create_pool(DatabaseConfig::new(&config.database_uri))
        .await
        .context("connecting to database")?;
    run_migrations(&pool).await.context("applying migrations")?;

    let store = Arc::new(PostgresOrderStore::new(pool.clone()));
    let users = Arc::new(PostgresUserStore::new(pool));
    let accrual = Arc::new(
        HttpAccrualClient::new(config.accrual_client_config()).context("building accrual client")?,
    );

    let shutdown = CancellationToken::new();
    let engine = Arc::new(ReconciliationEngine::new(
        store.clone(),
        accrual,
        config.reconciliation_config(),
    ));
    let scheduler = ReconciliationScheduler::new(engine, shutdown.clone());
    let reconciler = scheduler.spawn();

    let state = AppState::new(store.clone(), users, store, config.clone());
    let app = create_router(state);

    let listener = TcpListener::bind(&config.run_address)
        .await
        .with_context(|| format!("binding {}", config.run_address))?;
    tracing::info!(addr = %config.run_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // Stop the reconciliation loop and let an in-flight cycle finish
    scheduler.shutdown();
    if let Err(e) = reconciler.await {
        tracing::error!(error = %e, "Reconciliation task ended abnormally");
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM, then cancels `shutdown`.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = shutdown.cancelled() => {}
    }

    shutdown.cancel();
}
