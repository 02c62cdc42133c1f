//! Registration and login handlers

use super::ApiError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use taskboard_types::Credentials;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    token: String,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let Json(req) = payload?;
    info!("Registration attempt for: {}", req.login);

    if req.login.trim().is_empty() {
        return Err(ApiError::bad_request("login must not be empty"));
    }

    let issued = state.auth.register(&req).await?;

    info!(user_id = issued.user_id, "Registration successful for: {}", req.login);

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token: issued.token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let Json(req) = payload?;
    info!("Login attempt for: {}", req.login);

    let issued = state.auth.login(&req).await.map_err(|e| {
        info!("Login failed for {}: {}", req.login, e);
        ApiError::from(e)
    })?;

    info!(user_id = issued.user_id, "Login successful for: {}", req.login);

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token: issued.token,
        }),
    ))
}
