//! Balance, withdrawal and withdrawal history handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::dto::{BalanceResponse, WithdrawRequest, WithdrawalResponse};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// Current balance and total withdrawn
pub async fn get_balance(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.loyalty.get_balance(user).await?;
    Ok(Json(balance.into()))
}

/// Spends points against a reference order number
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    payload: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let balance = state.loyalty.withdraw(user, request.order.trim(), request.sum).await?;
    Ok(Json(balance.into()))
}

/// Lists the caller's withdrawals, newest first
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let withdrawals = state.loyalty.list_user_withdrawals(user).await?;
    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let body: Vec<WithdrawalResponse> = withdrawals.into_iter().map(WithdrawalResponse::from).collect();
    Ok(Json(body).into_response())
}
