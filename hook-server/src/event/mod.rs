//! Webhook events and their effect on the meeting store.
//!
//! ## Processing Flow
//!
//! ```text
//! raw body → WebhookEnvelope → dispatch_event() → MeetingStore
//! ```

pub mod dispatch;
pub mod types;

pub use dispatch::{dispatch_event, DispatchError, DispatchOutcome};
pub use types::{
    EventKind, MeetingPayload, Participant, ParticipantPayload, ValidationPayload,
    WebhookEnvelope, EVENT_MEETING_ENDED, EVENT_PARTICIPANT_JOINED, EVENT_PARTICIPANT_LEFT,
    EVENT_URL_VALIDATION,
};
