use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use keel_shared::errors::{AppError, AppResult, ErrorCode};
use keel_shared::types::auth::UserRole;

use crate::services::{auth_service, session_service, user_service};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    pub password2: String,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<Response> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;
    auth_service::validate_password(&req.password, &req.password2)?;

    let password_hash = auth_service::hash_password(&req.password)?;
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // No existence pre-check: the unique index on email is authoritative and
    // its violation is remapped here, which also covers concurrent signups.
    let user = user_service::create_password_user(&mut conn, &req.email.to_lowercase(), &password_hash)
        .map_err(|e| {
            if user_service::is_unique_violation(&e) {
                AppError::new(ErrorCode::EmailTaken, "email already registered")
            } else {
                AppError::from(e)
            }
        })?;

    let role = user.role.parse().unwrap_or(UserRole::User);
    let pair = state.tokens.issue_pair(user.id, role)?;

    tracing::info!(user_id = user.id, "user signed up");

    Ok(session_service::establish(&state.config, StatusCode::CREATED, pair))
}
