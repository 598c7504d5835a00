use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use keel_shared::errors::{AppError, AppResult};
use keel_shared::types::auth::AuthUser;
use keel_shared::types::ApiResponse;

use crate::services::user_service;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i32,
    pub email: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

pub async fn me(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let record = user_service::find_by_id(&mut conn, user.id)?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    Ok(Json(ApiResponse::ok(MeResponse {
        id: record.id,
        email: record.email,
        role: record.role,
        created_at: record.created_at,
    })))
}
