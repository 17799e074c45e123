//! In-memory meeting store.
//!
//! Holds the same rows the Postgres table would, keyed by
//! `(meeting_id, participant_id)`. Contents are lost on restart.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MeetingStore, ParticipantRecord, StoreResult};

type Key = (String, String);

/// Process-local meeting store.
#[derive(Clone, Default)]
pub struct MemoryMeetingStore {
    rows: Arc<RwLock<BTreeMap<Key, ParticipantRecord>>>,
}

impl MemoryMeetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of participants across all meetings.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl MeetingStore for MemoryMeetingStore {
    async fn add_participant(
        &self,
        meeting_id: &str,
        host_id: &str,
        participant_id: &str,
        encrypted_name: &str,
    ) -> StoreResult<()> {
        let record = ParticipantRecord {
            meeting_id: meeting_id.to_string(),
            host_id: host_id.to_string(),
            participant_id: participant_id.to_string(),
            participant_name: encrypted_name.to_string(),
        };

        self.rows
            .write()
            .await
            .insert((meeting_id.to_string(), participant_id.to_string()), record);

        Ok(())
    }

    async fn remove_participant(
        &self,
        meeting_id: &str,
        participant_id: &str,
        _encrypted_name: &str,
    ) -> StoreResult<bool> {
        let key = (meeting_id.to_string(), participant_id.to_string());
        Ok(self.rows.write().await.remove(&key).is_some())
    }

    async fn remove_meeting(&self, meeting_id: &str) -> StoreResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|(meeting, _), _| meeting != meeting_id);
        Ok((before - rows.len()) as u64)
    }

    async fn participants(&self, meeting_id: &str) -> StoreResult<Vec<ParticipantRecord>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.meeting_id == meeting_id)
            .cloned()
            .collect())
    }
}
