//! Web server module for the meeting platform webhook.
//!
//! Routes:
//! - `POST /hook`: signed webhook deliveries
//! - `GET /health`: liveness probe

pub mod error;
pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::{AppError, ErrorResponse};
pub use handlers::{health, hook, AppState, HealthResponse};
pub use signature::{ChallengeResponse, WebhookVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/hook", post(hook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
