//! Webhook intake: validate, dispatch a background scan, answer immediately.

use std::any::Any;

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::errors::{AppError, WebhookResponse};
use crate::models::scan::ScanRequest;
use crate::AppState;

/// POST /webhook — start a scan of `image` for DefectDojo engagement `engagement_id`.
///
/// Answers `200` as soon as the run is dispatched. The run's outcome only
/// shows up in the logs and the report directory.
pub async fn receive(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError> {
    let scan = parse_request(&body).validate()?;
    let message = format!("Scan started for {}", scan.target.canonical_url);
    tracing::info!(url = %scan.target, engagement_id = %scan.engagement_id, "Received webhook for target");

    let run_id = state.dispatcher.dispatch(scan);
    tracing::debug!(run_id = %run_id, "Webhook answered before scan completion");

    Ok(WebhookResponse::accepted(message))
}

/// Read a scan request from a JSON object body.
///
/// Anything else carries no target, same as an object without one. Arrays
/// are refused outright so fields are never taken by position.
fn parse_request(body: &[u8]) -> ScanRequest {
    let parsed = serde_json::from_slice::<Value>(body).and_then(|value| match value {
        Value::Object(_) => serde_json::from_value(value),
        _ => Err(serde::de::Error::custom("expected a JSON object")),
    });

    parsed.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Webhook body is not a valid scan request");
        ScanRequest::default()
    })
}

/// Turn a handler panic into the generic `500` envelope.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("Error processing webhook request: {detail}")).into_response()
}
