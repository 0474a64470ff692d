//! HTTP API Layer
//!
//! This crate provides the REST API of the loyalty backend using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: registration and login, order upload, balance and withdrawals
//! - **Middleware**: Bearer-token authentication, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store.clone(), users, store, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_loyalty::{LoyaltyService, OrderStore, UserPort};

use crate::auth::AuthService;
use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{auth as auth_handlers, balance, health, orders};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub loyalty: LoyaltyService,
    pub auth: AuthService,
    pub health: Arc<dyn HealthCheckable>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the services over the given ports
    pub fn new(
        store: Arc<dyn OrderStore>,
        users: Arc<dyn UserPort>,
        health: Arc<dyn HealthCheckable>,
        config: ApiConfig,
    ) -> Self {
        let auth = AuthService::new(users, config.jwt_secret.clone(), config.jwt_expiration_secs);
        Self {
            loyalty: LoyaltyService::new(store),
            auth,
            health,
            config,
        }
    }
}

/// Creates the main API router
///
/// Register and login are public; every other `/api/user` route requires a
/// bearer token.
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/user/register", post(auth_handlers::register))
        .route("/api/user/login", post(auth_handlers::login));

    // Protected user routes
    let user_routes = Router::new()
        .route("/orders", post(orders::upload_order).get(orders::list_orders))
        .route("/balance", get(balance::get_balance))
        .route("/balance/withdraw", post(balance::withdraw))
        .route("/withdrawals", get(balance::list_withdrawals))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/user", user_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
