use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub notifier: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        notifier: "enabled",
    })
}

/// Served when the notifier could not be configured.
pub async fn disabled_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        notifier: "disabled",
    })
}
