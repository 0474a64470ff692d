//! Registration and login handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    Json,
};
use validator::Validate;

use crate::dto::{CredentialsRequest, TokenResponse};
use crate::error::ApiError;
use crate::AppState;

/// Registers a user and logs them in
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<TokenResponse>), ApiError> {
    let request = credentials(payload)?;
    let (_, token) = state.auth.register(&request.login, &request.password).await?;
    token_response(token)
}

/// Logs a user in
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<TokenResponse>), ApiError> {
    let request = credentials(payload)?;
    let (_, token) = state.auth.login(&request.login, &request.password).await?;
    token_response(token)
}

fn credentials(payload: Result<Json<CredentialsRequest>, JsonRejection>) -> Result<CredentialsRequest, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(request)
}

fn token_response(token: String) -> Result<(HeaderMap, Json<TokenResponse>), ApiError> {
    let value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value);
    Ok((headers, Json(TokenResponse { token })))
}
