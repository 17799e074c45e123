//! Event dispatch.
//!
//! Maps a webhook envelope onto at most one store operation:
//!
//! ```text
//! meeting.participant_joined → add_participant
//! meeting.participant_left   → remove_participant
//! meeting.ended              → remove_meeting
//! anything else              → ignored
//! ```

use thiserror::Error;
use tracing::info;

use super::types::{EventKind, MeetingPayload, Participant, ParticipantPayload, WebhookEnvelope};
use crate::crypto::{CryptoError, NameCipher};
use crate::store::{MeetingStore, StoreError};

/// Errors raised while applying an event. None are retried.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid payload for {event}: {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("participant in meeting {meeting_id} has no identifier")]
    MissingParticipantId { meeting_id: String },

    #[error("display name encryption failed: {0}")]
    Encryption(#[from] CryptoError),

    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

/// What a dispatched event did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    ParticipantAdded {
        meeting_id: String,
        participant_id: String,
    },
    ParticipantRemoved {
        meeting_id: String,
        participant_id: String,
        existed: bool,
    },
    MeetingRemoved {
        meeting_id: String,
        participants: u64,
    },
    Ignored,
}

/// Apply a webhook event to the store.
pub async fn dispatch_event(
    store: &dyn MeetingStore,
    cipher: &NameCipher,
    envelope: &WebhookEnvelope,
) -> Result<DispatchOutcome, DispatchError> {
    match envelope.kind() {
        EventKind::ParticipantJoined => {
            let object = participant_payload(envelope)?.object;
            let participant_id = resolve_participant_id(&object.id, &object.participant)?;
            let encrypted_name = cipher.encrypt(&object.participant.user_name)?;
            let host_id = object.host_id.unwrap_or_default();

            store
                .add_participant(&object.id, &host_id, &participant_id, &encrypted_name)
                .await?;

            info!(
                meeting_id = %object.id,
                host_id = %host_id,
                participant_id = %participant_id,
                "participant_added"
            );

            Ok(DispatchOutcome::ParticipantAdded {
                meeting_id: object.id,
                participant_id,
            })
        }
        EventKind::ParticipantLeft => {
            let object = participant_payload(envelope)?.object;
            let participant_id = resolve_participant_id(&object.id, &object.participant)?;
            let encrypted_name = cipher.encrypt(&object.participant.user_name)?;

            let existed = store
                .remove_participant(&object.id, &participant_id, &encrypted_name)
                .await?;

            info!(
                meeting_id = %object.id,
                participant_id = %participant_id,
                existed = existed,
                "participant_removed"
            );

            Ok(DispatchOutcome::ParticipantRemoved {
                meeting_id: object.id,
                participant_id,
                existed,
            })
        }
        EventKind::MeetingEnded => {
            let meeting_id = meeting_payload(envelope)?.object.id;

            let participants = store.remove_meeting(&meeting_id).await?;

            info!(
                meeting_id = %meeting_id,
                participants = participants,
                "meeting_removed"
            );

            Ok(DispatchOutcome::MeetingRemoved {
                meeting_id,
                participants,
            })
        }
        EventKind::UrlValidation | EventKind::Other => {
            info!(event = %envelope.event, "event_ignored");
            Ok(DispatchOutcome::Ignored)
        }
    }
}

fn participant_payload(envelope: &WebhookEnvelope) -> Result<ParticipantPayload, DispatchError> {
    envelope
        .payload_as()
        .map_err(|source| DispatchError::InvalidPayload {
            event: envelope.event.clone(),
            source,
        })
}

fn meeting_payload(envelope: &WebhookEnvelope) -> Result<MeetingPayload, DispatchError> {
    envelope
        .payload_as()
        .map_err(|source| DispatchError::InvalidPayload {
            event: envelope.event.clone(),
            source,
        })
}

fn resolve_participant_id(
    meeting_id: &str,
    participant: &Participant,
) -> Result<String, DispatchError> {
    participant
        .resolved_id()
        .map(str::to_string)
        .ok_or_else(|| DispatchError::MissingParticipantId {
            meeting_id: meeting_id.to_string(),
        })
}
