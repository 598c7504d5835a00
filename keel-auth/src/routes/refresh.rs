use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use keel_shared::errors::{AppError, AppResult, ErrorCode};
use keel_shared::middleware::{cookie_value, REFRESH_COOKIE};

use crate::services::session_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Rotation: every successful refresh yields a brand-new pair and the caller
/// discards the presented token. Nothing is tracked server-side, so an old
/// but unexpired refresh token technically remains usable until it expires.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<Response> {
    let presented = body
        .and_then(|Json(req)| req.refresh_token)
        .or_else(|| cookie_value(&headers, REFRESH_COOKIE))
        .ok_or_else(|| AppError::new(ErrorCode::TokenInvalid, "missing refresh token"))?;

    let pair = state.tokens.refresh(&presented)?;

    Ok(session_service::establish(&state.config, StatusCode::OK, pair))
}
