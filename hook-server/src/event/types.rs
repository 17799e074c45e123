//! Webhook envelope types.
//!
//! Every delivery is `{"event": "...", "event_ts": 123, "payload": {...}}`.
//! The payload shape depends on the event name, so it is kept as raw JSON
//! until the dispatcher knows which shape to expect.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One-time handshake proving possession of the shared secret.
pub const EVENT_URL_VALIDATION: &str = "endpoint.url_validation";

pub const EVENT_PARTICIPANT_JOINED: &str = "meeting.participant_joined";

pub const EVENT_PARTICIPANT_LEFT: &str = "meeting.participant_left";

pub const EVENT_MEETING_ENDED: &str = "meeting.ended";

/// Event names this service reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    UrlValidation,
    ParticipantJoined,
    ParticipantLeft,
    MeetingEnded,
    Other,
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            EVENT_URL_VALIDATION => EventKind::UrlValidation,
            EVENT_PARTICIPANT_JOINED => EventKind::ParticipantJoined,
            EVENT_PARTICIPANT_LEFT => EventKind::ParticipantLeft,
            EVENT_MEETING_ENDED => EventKind::MeetingEnded,
            _ => EventKind::Other,
        }
    }
}

/// Top-level webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    /// Delivery time as sent; only logged, so any JSON type is accepted.
    #[serde(default)]
    pub event_ts: Option<Value>,
    #[serde(default)]
    pub payload: Value,
}

impl WebhookEnvelope {
    pub fn kind(&self) -> EventKind {
        EventKind::from_name(&self.event)
    }

    /// Decode the payload into the shape expected for this event.
    pub fn payload_as<T>(&self) -> Result<T, serde_json::Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        T::deserialize(&self.payload)
    }
}

/// Payload of `endpoint.url_validation`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationPayload {
    #[serde(rename = "plainToken")]
    pub plain_token: String,
}

/// Payload of participant joined/left events.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantPayload {
    pub object: ParticipantEventObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantEventObject {
    /// Meeting identifier
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub host_id: Option<String>,
    pub participant: Participant,
}

/// Participant descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    #[serde(default, deserialize_with = "optional_id_string")]
    pub participant_user_id: Option<String>,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub user_name: String,
}

impl Participant {
    /// First non-empty of `participant_user_id` and `id`.
    pub fn resolved_id(&self) -> Option<&str> {
        [&self.participant_user_id, &self.id]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.is_empty())
    }
}

/// Payload of `meeting.ended`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeetingPayload {
    pub object: MeetingEventObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingEventObject {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

/// Identifiers arrive as strings or bare numbers depending on the event.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}
