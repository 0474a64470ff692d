//! Order upload and listing handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::info;

use domain_loyalty::LoyaltyError;

use crate::dto::OrderResponse;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// Uploads an order number sent as the plain-text body
///
/// `202` for a new order, `200` when the caller already uploaded it.
pub async fn upload_order(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: String,
) -> Result<StatusCode, ApiError> {
    let number = body.trim();
    if number.is_empty() {
        return Err(ApiError::BadRequest("order number is required".to_string()));
    }

    match state.loyalty.upload_order(user, number).await {
        Ok(order) => {
            info!(order = %order.number, user = %user, "Order accepted");
            Ok(StatusCode::ACCEPTED)
        }
        Err(LoyaltyError::AlreadyUploadedBySameUser(_)) => Ok(StatusCode::OK),
        Err(e) => Err(e.into()),
    }
}

/// Lists the caller's orders, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let orders = state.loyalty.list_user_orders(user).await?;
    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(Json(body).into_response())
}
