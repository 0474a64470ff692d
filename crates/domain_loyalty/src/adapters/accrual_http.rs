//! HTTP Accrual Client
//!
//! Implements [`AccrualPort`] against the accrual authority's REST API.
//!
//! # Wire Contract
//!
//! `GET {base_url}/api/orders/{number}`
//!
//! - 200 -> JSON `{"order": "...", "status": "...", "accrual": 500.5}`
//! - 204 -> `AccrualError::OrderNotRegistered`
//! - 429 -> `AccrualError::RateLimited`, honouring `Retry-After` in seconds
//!   up to `max_retry_after`
//! - other -> `AccrualError::UnexpectedResponse`
//! - connect failure or timeout -> `AccrualError::Transport`
//! - undecodable body -> `AccrualError::Decode`

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use core_kernel::{Amount, DomainPort};

use crate::accrual::{AccrualError, AccrualInfo, AccrualPort, AccrualStatus};
use crate::order_number::OrderNumber;

/// Configuration for the accrual client
#[derive(Debug, Clone)]
pub struct AccrualClientConfig {
    /// Base URL of the authority; `http://` is assumed without a scheme
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Pause applied when a 429 carries no usable `Retry-After`
    pub default_retry_after: Duration,

    /// Longest pause a `Retry-After` header can request
    pub max_retry_after: Duration,
}

impl Default for AccrualClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(5),
            default_retry_after: Duration::from_secs(60),
            max_retry_after: Duration::from_secs(3600),
        }
    }
}

impl AccrualClientConfig {
    /// Creates a config for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_retry_after(mut self, retry_after: Duration) -> Self {
        self.default_retry_after = retry_after;
        self
    }

    pub fn with_max_retry_after(mut self, max_retry_after: Duration) -> Self {
        self.max_retry_after = max_retry_after;
        self
    }

    /// Base URL with a scheme and without a trailing slash
    pub fn normalized_base(&self) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!("http://{}", base)
        }
    }
}

/// Response body of the authority
#[derive(Debug, Deserialize)]
struct AccrualResponse {
    order: String,
    status: AccrualStatus,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    accrual: Option<Decimal>,
}

/// Accrual authority client backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpAccrualClient {
    client: reqwest::Client,
    base_url: String,
    default_retry_after: Duration,
    max_retry_after: Duration,
}

impl HttpAccrualClient {
    /// Builds the client
    ///
    /// # Errors
    ///
    /// Returns `AccrualError::Transport` if the TLS backend cannot be
    /// initialised.
    pub fn new(config: AccrualClientConfig) -> Result<Self, AccrualError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AccrualError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.normalized_base(),
            default_retry_after: config.default_retry_after,
            max_retry_after: config.max_retry_after,
        })
    }

    /// The normalized base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn retry_after(&self, response: &reqwest::Response) -> Duration {
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs).min(self.max_retry_after))
            .unwrap_or(self.default_retry_after)
    }

    fn decode(&self, number: &OrderNumber, body: AccrualResponse) -> Result<AccrualInfo, AccrualError> {
        let order = OrderNumber::parse(body.order)
            .map_err(|e| AccrualError::Decode(e.to_string()))?;
        if &order != number {
            return Err(AccrualError::Decode(format!(
                "asked for order {}, got {}",
                number, order
            )));
        }

        Ok(AccrualInfo {
            order,
            status: body.status,
            accrual: body.accrual.map(Amount::new),
        })
    }
}

impl DomainPort for HttpAccrualClient {}

#[async_trait]
impl AccrualPort for HttpAccrualClient {
    #[tracing::instrument(skip(self), fields(order = %number))]
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<AccrualInfo, AccrualError> {
        let url = format!("{}/api/orders/{}", self.base_url, number);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AccrualError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body: AccrualResponse = response
                    .json()
                    .await
                    .map_err(|e| AccrualError::Decode(e.to_string()))?;
                self.decode(number, body)
            }
            StatusCode::NO_CONTENT => Err(AccrualError::OrderNotRegistered),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = self.retry_after(&response);
                tracing::warn!(
                    retry_after_secs = retry_after.as_secs(),
                    "Accrual system rate limit hit"
                );
                Err(AccrualError::RateLimited { retry_after })
            }
            status => {
                tracing::warn!(status = status.as_u16(), "Unexpected accrual response");
                Err(AccrualError::UnexpectedResponse {
                    status: status.as_u16(),
                })
            }
        }
    }
}
