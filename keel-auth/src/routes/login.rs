use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use keel_shared::errors::{AppError, AppResult, ErrorCode};
use keel_shared::types::auth::UserRole;

use crate::services::{auth_service, session_service, user_service};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Unknown email, pure-OAuth user and wrong password all fail the same way.
    let invalid = || AppError::new(ErrorCode::InvalidCredentials, "invalid email or password");

    let user = user_service::find_by_email(&mut conn, &req.email.to_lowercase())?
        .ok_or_else(invalid)?;
    let password_hash = user.password_hash.as_deref().ok_or_else(invalid)?;

    if !auth_service::verify_password(&req.password, password_hash) {
        return Err(invalid());
    }

    let role = user.role.parse().unwrap_or(UserRole::User);
    let pair = state.tokens.issue_pair(user.id, role)?;

    tracing::info!(user_id = user.id, "user logged in");

    Ok(session_service::establish(&state.config, StatusCode::OK, pair))
}
