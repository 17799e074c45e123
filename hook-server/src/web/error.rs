//! HTTP error mapping for the webhook endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::event::DispatchError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Signature verification failed while verification is required.
    #[error("Invalid webhook signature")]
    Unauthorized,

    /// Body is not a JSON webhook envelope.
    #[error("Malformed webhook body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::MalformedBody(_) => (StatusCode::BAD_REQUEST, "MALFORMED_BODY"),
            Self::Dispatch(DispatchError::InvalidPayload { .. })
            | Self::Dispatch(DispatchError::MissingParticipantId { .. }) => {
                (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD")
            }
            Self::Dispatch(DispatchError::Encryption(_))
            | Self::Dispatch(DispatchError::Store(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "webhook_failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: code,
                message,
            }),
        )
            .into_response()
    }
}
