use axum::response::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness probe
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}
