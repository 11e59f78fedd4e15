//! `GET /health` - liveness plus a database round trip. No identity needed.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::dto::HealthView;
use crate::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthView>) {
    if state.db.health_check().await {
        (
            StatusCode::OK,
            Json(HealthView {
                status: "ok".to_string(),
                database: "up".to_string(),
            }),
        )
    } else {
        tracing::error!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthView {
                status: "degraded".to_string(),
                database: "down".to_string(),
            }),
        )
    }
}
