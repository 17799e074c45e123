//! Meeting presence persistence.
//!
//! The dispatcher only talks to [`MeetingStore`]. Two implementations ship:
//! - [`PgMeetingStore`]: Postgres via sqlx, used when `DATABASE_URL` is set
//! - [`MemoryMeetingStore`]: process-local map for development and tests

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryMeetingStore;
pub use postgres::PgMeetingStore;

/// Store errors. None of them are retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A participant currently present in a meeting.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ParticipantRecord {
    pub meeting_id: String,
    pub host_id: String,
    pub participant_id: String,
    /// Encrypted display name
    pub participant_name: String,
}

/// Persistent store for meeting participants.
#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// Record that a participant joined. A rejoin refreshes the existing row.
    async fn add_participant(
        &self,
        meeting_id: &str,
        host_id: &str,
        participant_id: &str,
        encrypted_name: &str,
    ) -> StoreResult<()>;

    /// Remove a participant that left a meeting.
    ///
    /// Returns whether a row was removed.
    async fn remove_participant(
        &self,
        meeting_id: &str,
        participant_id: &str,
        encrypted_name: &str,
    ) -> StoreResult<bool>;

    /// Drop every participant of an ended meeting.
    ///
    /// Returns the number of removed rows.
    async fn remove_meeting(&self, meeting_id: &str) -> StoreResult<u64>;

    /// List participants currently recorded for a meeting.
    async fn participants(&self, meeting_id: &str) -> StoreResult<Vec<ParticipantRecord>>;

    /// Release underlying resources.
    async fn close(&self) {}
}
