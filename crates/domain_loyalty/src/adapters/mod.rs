//! External Adapters for the Loyalty Domain
//!
//! Adapter implementations for systems the loyalty domain does not own.
//!
//! # Available Adapters
//!
//! - **HttpAccrualClient**: queries the accrual authority over HTTP
//! - **MockAccrualPort**: scripted in-memory authority for testing
//!   (re-exported from the ports module under the `mock` feature)
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_loyalty::adapters::{AccrualClientConfig, HttpAccrualClient};
//! use domain_loyalty::AccrualPort;
//! use std::sync::Arc;
//!
//! let config = AccrualClientConfig::new("http://localhost:8080")
//!     .with_timeout(Duration::from_secs(5));
//! let accrual: Arc<dyn AccrualPort> = Arc::new(HttpAccrualClient::new(config)?);
//! ```

pub mod accrual_http;

pub use accrual_http::{AccrualClientConfig, HttpAccrualClient};

#[cfg(any(test, feature = "mock"))]
pub use crate::ports::mock::MockAccrualPort;
