//! Unified error handling with the webhook response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Message returned when the webhook payload lacks a target or engagement.
pub const MISSING_FIELDS_MESSAGE: &str = "No image or engagement_id specified";

/// Message returned for any unexpected failure in the request path.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// `{status, message}` envelope used by every webhook response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
}

impl WebhookResponse {
    /// Envelope for a scan that has been dispatched.
    pub fn accepted(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "accepted".to_string(),
            message: message.into(),
        })
    }

    /// Envelope for a rejected or failed request.
    pub fn error(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "error".to_string(),
            message: message.into(),
        })
    }
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Check if this error is caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, WebhookResponse::error(message)).into_response()
    }
}

/// Errors raised by the outbound scanner and findings-backend clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Payload(String),
}
