//! Postgres-backed meeting store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use super::{MeetingStore, ParticipantRecord, StoreResult};

/// Meeting store over a sqlx connection pool.
#[derive(Clone)]
pub struct PgMeetingStore {
    pool: PgPool,
}

impl PgMeetingStore {
    /// Connect to Postgres and apply pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        info!(max_connections = max_connections, "database_connecting");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database_ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl MeetingStore for PgMeetingStore {
    async fn add_participant(
        &self,
        meeting_id: &str,
        host_id: &str,
        participant_id: &str,
        encrypted_name: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO meeting_participants (meeting_id, host_id, participant_id, participant_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (meeting_id, participant_id)
            DO UPDATE SET host_id = EXCLUDED.host_id,
                          participant_name = EXCLUDED.participant_name,
                          joined_at = NOW()
            ",
        )
        .bind(meeting_id)
        .bind(host_id)
        .bind(participant_id)
        .bind(encrypted_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_participant(
        &self,
        meeting_id: &str,
        participant_id: &str,
        _encrypted_name: &str,
    ) -> StoreResult<bool> {
        // Names are encrypted with a random nonce, so rows are matched by id only.
        let result = sqlx::query(
            r"
            DELETE FROM meeting_participants
            WHERE meeting_id = $1 AND participant_id = $2
            ",
        )
        .bind(meeting_id)
        .bind(participant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_meeting(&self, meeting_id: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM meeting_participants WHERE meeting_id = $1")
            .bind(meeting_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn participants(&self, meeting_id: &str) -> StoreResult<Vec<ParticipantRecord>> {
        let rows = sqlx::query_as::<_, ParticipantRecord>(
            r"
            SELECT meeting_id, host_id, participant_id, participant_name
            FROM meeting_participants
            WHERE meeting_id = $1
            ORDER BY joined_at ASC, participant_id ASC
            ",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("database_pool_closed");
    }
}
