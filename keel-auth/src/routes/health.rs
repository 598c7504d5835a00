use axum::Json;
use keel_shared::types::api::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("keel-auth", env!("CARGO_PKG_VERSION")))
}
