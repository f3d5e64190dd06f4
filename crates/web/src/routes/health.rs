//! Health check endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sites: usize,
    pub default_site: String,
}

/// Health check endpoint
///
/// Unhealthy when the default site cannot be resolved, since every request
/// for an unknown host falls back to it.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let table = state.resolver.table();

    let overall_status = match state.resolver.default_site() {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Default site is not resolvable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    (
        overall_status,
        Json(HealthResponse {
            status: if overall_status == StatusCode::OK {
                "healthy".to_string()
            } else {
                "unhealthy".to_string()
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            sites: table.len(),
            default_site: table.default_label().to_string(),
        }),
    )
}

/// Liveness check (just returns 200 if the server is running)
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
