//! Health check

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub version: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, store) = if state.auth_service.store_healthy().await {
        ("healthy", "connected")
    } else {
        ("unhealthy", "unreachable")
    };

    Json(HealthResponse {
        status: status.to_string(),
        store: store.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
