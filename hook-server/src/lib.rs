//! Hook Server - meeting platform webhook receiver.
//!
//! Receives signed event notifications, answers the platform's URL
//! validation handshake and keeps a store of who is in which meeting.
//!
//! ## Architecture
//!
//! ```text
//! Platform → POST /hook → WebhookVerifier → dispatch_event → MeetingStore
//! ```

pub mod config;
pub mod crypto;
pub mod event;
pub mod store;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use crypto::NameCipher;
pub use event::{dispatch_event, DispatchOutcome, WebhookEnvelope};
pub use store::{MeetingStore, MemoryMeetingStore, PgMeetingStore};
pub use web::{router, AppState, WebhookVerifier};
