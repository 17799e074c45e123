//! Meeting platform webhook signature verification.
//!
//! The platform signs every request with HMAC-SHA256 over
//! `v0:{x-zm-request-timestamp}:{raw body}` and sends the result as
//! `x-zm-signature: v0={hex digest}`. The same secret answers the one-time
//! `endpoint.url_validation` handshake.

use axum::http::Method;
use hmac::{digest::InvalidLength, Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request timestamp.
pub const TIMESTAMP_HEADER: &str = "x-zm-request-timestamp";

/// Header carrying the `v0=` prefixed signature.
pub const SIGNATURE_HEADER: &str = "x-zm-signature";

/// Version tag for both the signed message and the signature.
const SIGNATURE_VERSION: &str = "v0";

/// Body returned for the URL validation handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub plain_token: String,
    pub encrypted_token: String,
}

/// Verifies inbound webhooks against the shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    keyed: HmacSha256,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier").finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Result<Self, InvalidLength> {
        Ok(Self {
            keyed: HmacSha256::new_from_slice(secret.as_bytes())?,
        })
    }

    fn mac(&self) -> HmacSha256 {
        self.keyed.clone()
    }

    /// Compute the `v0=` signature the platform would send for this body.
    pub fn compute_signature(&self, timestamp: &str, body: &[u8]) -> String {
        let mut mac = self.mac();
        mac.update(SIGNATURE_VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);

        format!(
            "{}={}",
            SIGNATURE_VERSION,
            hex::encode(mac.finalize().into_bytes())
        )
    }

    /// Check whether a request was signed with the shared secret.
    ///
    /// The body must be the raw request bytes exactly as received; a
    /// re-serialized payload will not match the sender's digest. Any
    /// mismatch, missing header or non-POST method yields `false`.
    pub fn is_valid_request(
        &self,
        method: &Method,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> bool {
        if *method != Method::POST {
            warn!(method = %method, "webhook_signature_wrong_method");
            return false;
        }

        let (timestamp, signature) = match (timestamp, signature) {
            (Some(t), Some(s)) => (t, s),
            (t, s) => {
                warn!(
                    has_timestamp = t.is_some(),
                    has_signature = s.is_some(),
                    "webhook_signature_missing_headers"
                );
                return false;
            }
        };

        let expected = self.compute_signature(timestamp, body);
        let valid = constant_time_compare(&expected, signature);

        if !valid {
            warn!(
                timestamp = %timestamp,
                expected_length = expected.len(),
                actual_length = signature.len(),
                "webhook_signature_mismatch"
            );
        }

        valid
    }

    /// Answer the platform's URL validation challenge.
    pub fn challenge_response(&self, plain_token: &str) -> ChallengeResponse {
        let mut mac = self.mac();
        mac.update(plain_token.as_bytes());

        ChallengeResponse {
            plain_token: plain_token.to_string(),
            encrypted_token: hex::encode(mac.finalize().into_bytes()),
        }
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
