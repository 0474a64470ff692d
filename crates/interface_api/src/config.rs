//! API configuration
//!
//! Values come from `LOYALTY_*` environment variables. The unprefixed
//! `RUN_ADDRESS`, `DATABASE_URI` and `ACCRUAL_SYSTEM_ADDRESS` variables are
//! honoured as defaults, so existing deployments keep working.

use std::time::Duration;

use serde::Deserialize;

use domain_loyalty::{AccrualClientConfig, ReconciliationConfig};

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    pub run_address: String,
    /// PostgreSQL connection string
    pub database_uri: String,
    /// Base URL of the accrual authority
    pub accrual_system_address: String,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Log level
    pub log_level: String,
    /// Seconds between reconciliation cycles
    pub reconcile_interval_secs: u64,
    /// Orders selected per reconciliation cycle
    pub reconcile_batch_size: u32,
    /// Per-request timeout for the accrual authority
    pub accrual_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            run_address: "localhost:8090".to_string(),
            database_uri: "postgres://localhost/loyalty".to_string(),
            accrual_system_address: "http://localhost:8080".to_string(),
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            log_level: "info".to_string(),
            reconcile_interval_secs: 10,
            reconcile_batch_size: 100,
            accrual_timeout_secs: 5,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = ApiConfig::default();

        config::Config::builder()
            .set_default("run_address", env_or("RUN_ADDRESS", defaults.run_address))?
            .set_default("database_uri", env_or("DATABASE_URI", defaults.database_uri))?
            .set_default(
                "accrual_system_address",
                env_or("ACCRUAL_SYSTEM_ADDRESS", defaults.accrual_system_address),
            )?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_expiration_secs", defaults.jwt_expiration_secs as i64)?
            .set_default("log_level", defaults.log_level)?
            .set_default("reconcile_interval_secs", defaults.reconcile_interval_secs as i64)?
            .set_default("reconcile_batch_size", i64::from(defaults.reconcile_batch_size))?
            .set_default("accrual_timeout_secs", defaults.accrual_timeout_secs as i64)?
            .add_source(config::Environment::with_prefix("LOYALTY"))
            .build()?
            .try_deserialize()
    }

    /// Settings for the background reconciliation engine
    pub fn reconciliation_config(&self) -> ReconciliationConfig {
        ReconciliationConfig::default()
            .with_interval(Duration::from_secs(self.reconcile_interval_secs.max(1)))
            .with_batch_size(self.reconcile_batch_size.max(1))
    }

    /// Settings for the accrual authority client
    pub fn accrual_client_config(&self) -> AccrualClientConfig {
        AccrualClientConfig::new(&self.accrual_system_address)
            .with_timeout(Duration::from_secs(self.accrual_timeout_secs.max(1)))
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.run_address, "localhost:8090");
        assert_eq!(config.jwt_expiration_secs, 3600);
        assert_eq!(config.reconcile_batch_size, 100);
    }

    #[test]
    fn test_reconciliation_config_from_api_config() {
        let config = ApiConfig {
            reconcile_interval_secs: 30,
            reconcile_batch_size: 25,
            ..ApiConfig::default()
        };

        let reconcile = config.reconciliation_config();
        assert_eq!(reconcile.interval, Duration::from_secs(30));
        assert_eq!(reconcile.batch_size, 25);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = ApiConfig {
            reconcile_interval_secs: 0,
            ..ApiConfig::default()
        };
        assert_eq!(config.reconciliation_config().interval, Duration::from_secs(1));
    }

    #[test]
    fn test_accrual_client_config() {
        let config = ApiConfig {
            accrual_system_address: "accrual:8080/".to_string(),
            accrual_timeout_secs: 2,
            ..ApiConfig::default()
        };

        let client = config.accrual_client_config();
        assert_eq!(client.timeout, Duration::from_secs(2));
        assert_eq!(client.normalized_base(), "http://accrual:8080");
    }
}
