//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub scanner: String,
}

/// Liveness probe — always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe — reports the ZAP version, or why it could not be reached.
pub async fn ready(State(state): State<AppState>) -> Json<HealthStatus> {
    let scanner = match state.scanner.version().await {
        Ok(version) => format!("zap {version}"),
        Err(e) => {
            tracing::warn!(error = %e, "Scanner health check failed");
            format!("error: {e}")
        }
    };

    Json(HealthStatus {
        status: "ok".to_string(),
        scanner,
    })
}
