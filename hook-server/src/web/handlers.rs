//! Webhook endpoint handlers.
//!
//! `POST /hook` does, in order:
//! 1. Verify the HMAC signature over the raw body
//! 2. Answer the URL validation handshake if requested
//! 3. Apply participant/meeting events to the store
//! 4. Return 200 with an empty body

use std::sync::Arc;

use anyhow::{anyhow, Context};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::crypto::NameCipher;
use crate::event::{dispatch_event, DispatchError, EventKind, ValidationPayload, WebhookEnvelope};
use crate::store::MeetingStore;
use crate::web::error::AppError;
use crate::web::signature::{WebhookVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<WebhookVerifier>,
    pub cipher: Arc<NameCipher>,
    pub store: Arc<dyn MeetingStore>,
    pub require_signature: bool,
}

impl AppState {
    pub fn new(
        verifier: WebhookVerifier,
        cipher: NameCipher,
        store: Arc<dyn MeetingStore>,
        require_signature: bool,
    ) -> Self {
        Self {
            verifier: Arc::new(verifier),
            cipher: Arc::new(cipher),
            store,
            require_signature,
        }
    }

    /// Build state from loaded configuration.
    pub fn from_config(config: &Config, store: Arc<dyn MeetingStore>) -> anyhow::Result<Self> {
        let verifier = WebhookVerifier::new(&config.secret_token)
            .map_err(|e| anyhow!("invalid webhook secret: {e}"))?;
        let cipher = NameCipher::from_hex_key(&config.encryption_key)
            .context("Failed to load encryption key")?;

        Ok(Self::new(verifier, cipher, store, config.require_signature))
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Meeting Webhook
// =============================================================================

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Meeting platform webhook endpoint.
pub async fn hook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let verified = state.verifier.is_valid_request(
        &method,
        header_str(&headers, TIMESTAMP_HEADER),
        header_str(&headers, SIGNATURE_HEADER),
        &body,
    );

    if !verified && state.require_signature {
        warn!(body_length = body.len(), "webhook_rejected_unverified");
        return Err(AppError::Unauthorized);
    }

    let envelope: WebhookEnvelope = serde_json::from_slice(&body)?;

    info!(
        event = %envelope.event,
        event_ts = ?envelope.event_ts,
        verified = verified,
        body_length = body.len(),
        "webhook_received"
    );

    if verified && envelope.kind() == EventKind::UrlValidation {
        let payload: ValidationPayload = envelope.payload_as().map_err(|source| {
            DispatchError::InvalidPayload {
                event: envelope.event.clone(),
                source,
            }
        })?;

        info!("url_validation_answered");

        return Ok(Json(state.verifier.challenge_response(&payload.plain_token)).into_response());
    }

    if !verified {
        warn!(event = %envelope.event, "webhook_dispatching_unverified");
    }

    let outcome = dispatch_event(state.store.as_ref(), &state.cipher, &envelope).await?;

    info!(event = %envelope.event, outcome = ?outcome, "webhook_handled");

    Ok(StatusCode::OK.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    use tower::ServiceExt;

    use crate::store::{ParticipantRecord, StoreError, StoreResult};
    use crate::web::router;

    const SECRET: &str = "test-secret";

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Add {
            meeting_id: String,
            host_id: String,
            participant_id: String,
        },
        Remove {
            meeting_id: String,
            participant_id: String,
        },
        RemoveMeeting {
            meeting_id: String,
        },
    }

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<Call>>,
        fail: bool,
    }

    impl RecordingStore {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> StoreResult<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MeetingStore for RecordingStore {
        async fn add_participant(
            &self,
            meeting_id: &str,
            host_id: &str,
            participant_id: &str,
            _encrypted_name: &str,
        ) -> StoreResult<()> {
            self.record(Call::Add {
                meeting_id: meeting_id.to_string(),
                host_id: host_id.to_string(),
                participant_id: participant_id.to_string(),
            })
        }

        async fn remove_participant(
            &self,
            meeting_id: &str,
            participant_id: &str,
            _encrypted_name: &str,
        ) -> StoreResult<bool> {
            self.record(Call::Remove {
                meeting_id: meeting_id.to_string(),
                participant_id: participant_id.to_string(),
            })?;
            Ok(true)
        }

        async fn remove_meeting(&self, meeting_id: &str) -> StoreResult<u64> {
            self.record(Call::RemoveMeeting {
                meeting_id: meeting_id.to_string(),
            })?;
            Ok(0)
        }

        async fn participants(&self, _meeting_id: &str) -> StoreResult<Vec<ParticipantRecord>> {
            Ok(Vec::new())
        }
    }

    fn app(store: Arc<RecordingStore>, require_signature: bool) -> axum::Router {
        let state = AppState::new(
            WebhookVerifier::new(SECRET).unwrap(),
            NameCipher::new(&[9u8; 32]).unwrap(),
            store,
            require_signature,
        );
        router(state)
    }

    fn signed(body: &str) -> Request<Body> {
        let timestamp = "1700000000";
        let signature = WebhookVerifier::new(SECRET)
            .unwrap()
            .compute_signature(timestamp, body.as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/hook")
            .header("content-type", "application/json")
            .header(TIMESTAMP_HEADER, timestamp)
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn unsigned(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/hook")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    const JOINED: &str = r#"{"event":"meeting.participant_joined","event_ts":1700000000000,"payload":{"object":{"id":"m1","host_id":"h1","participant":{"id":"u1","user_name":"Ada"}}}}"#;

    #[tokio::test]
    async fn test_url_validation_handshake() {
        let store = Arc::new(RecordingStore::default());
        let body = r#"{"event":"endpoint.url_validation","payload":{"plainToken":"xyz"}}"#;

        let response = app(store.clone(), true).oneshot(signed(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();

        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(b"xyz");
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(json["plainToken"], "xyz");
        assert_eq!(json["encryptedToken"], expected);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_participant_joined_uses_fallback_id() {
        let store = Arc::new(RecordingStore::default());

        let response = app(store.clone(), true).oneshot(signed(JOINED)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
        assert_eq!(
            store.calls(),
            vec![Call::Add {
                meeting_id: "m1".to_string(),
                host_id: "h1".to_string(),
                participant_id: "u1".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_participant_left() {
        let store = Arc::new(RecordingStore::default());
        let body = r#"{"event":"meeting.participant_left","payload":{"object":{"id":"m1","host_id":"h1","participant":{"participant_user_id":"pu1","id":"u1","user_name":"Ada"}}}}"#;

        let response = app(store.clone(), true).oneshot(signed(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            store.calls(),
            vec![Call::Remove {
                meeting_id: "m1".to_string(),
                participant_id: "pu1".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_meeting_ended_single_call() {
        let store = Arc::new(RecordingStore::default());
        let body = r#"{"event":"meeting.ended","payload":{"object":{"id":"m1","host_id":"h1"}}}"#;

        let response = app(store.clone(), true).oneshot(signed(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            store.calls(),
            vec![Call::RemoveMeeting {
                meeting_id: "m1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_event_acknowledged() {
        let store = Arc::new(RecordingStore::default());
        let body = r#"{"event":"meeting.sharing_started","payload":{"object":{"id":"m1"}}}"#;

        let response = app(store.clone(), true).oneshot(signed(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsigned_rejected_when_required() {
        let store = Arc::new(RecordingStore::default());

        let response = app(store.clone(), true).oneshot(unsigned(JOINED)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_tampered_body_rejected() {
        let store = Arc::new(RecordingStore::default());
        let mut request = signed(JOINED);
        *request.body_mut() = Body::from(JOINED.replace("u1", "u2"));

        let response = app(store.clone(), true).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsigned_dispatched_when_not_required() {
        let store = Arc::new(RecordingStore::default());

        let response = app(store.clone(), false).oneshot(unsigned(JOINED)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unsigned_handshake_not_answered() {
        let store = Arc::new(RecordingStore::default());
        let body = r#"{"event":"endpoint.url_validation","payload":{"plainToken":"xyz"}}"#;

        let response = app(store.clone(), false).oneshot(unsigned(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let store = Arc::new(RecordingStore::default());

        let response = app(store.clone(), true).oneshot(signed("not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_string_event_ts_still_dispatched() {
        let store = Arc::new(RecordingStore::default());
        let body = JOINED.replace("1700000000000", "\"1700000000000\"");

        let response = app(store.clone(), true).oneshot(signed(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            store.calls(),
            vec![Call::Add {
                meeting_id: "m1".to_string(),
                host_id: "h1".to_string(),
                participant_id: "u1".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_url_validation_without_plain_token() {
        let store = Arc::new(RecordingStore::default());
        let body = r#"{"event":"endpoint.url_validation","payload":{}}"#;

        let response = app(store.clone(), true).oneshot(signed(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["error"], "INVALID_PAYLOAD");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_server_error() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });

        let response = app(store.clone(), true).oneshot(signed(JOINED)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_health() {
        let store = Arc::new(RecordingStore::default());
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app(store, true).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["status"], "ok");
    }
}
