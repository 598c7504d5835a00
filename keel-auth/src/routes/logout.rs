use axum::extract::State;
use axum::response::Response;

use crate::services::session_service;
use crate::AppState;

pub async fn logout(State(state): State<AppState>) -> Response {
    session_service::clear(&state.config)
}
