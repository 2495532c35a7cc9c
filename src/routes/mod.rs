//! Route definitions for the webhook API.

pub mod health;
pub mod webhook;

use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Largest webhook body accepted.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the full router with its middleware stack.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook::receive))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(webhook::handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
