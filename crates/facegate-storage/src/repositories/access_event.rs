#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::AccessEvent;
use chrono::{DateTime, Utc};
use facegate_core::{IdentityId, Verdict};
use sqlx::SqlitePool;

/// Repository trait for the access event log
///
/// Events are append-only; there is no update or delete.
pub trait AccessEventRepository: Send + Sync {
    /// Append an event, returning its row id
    async fn create(&self, event: &AccessEvent) -> StorageResult<i64>;

    /// Most recent events first
    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessEvent>>;

    /// Most recent events for one identity
    async fn find_by_identity(
        &self,
        identity_id: &IdentityId,
        limit: i64,
    ) -> StorageResult<Vec<AccessEvent>>;

    /// Most recent events with the given verdict
    async fn find_by_verdict(&self, verdict: Verdict, limit: i64) -> StorageResult<Vec<AccessEvent>>;

    /// Count events with the given verdict since `since`
    async fn count_by_verdict(&self, verdict: Verdict, since: DateTime<Utc>) -> StorageResult<i64>;
}

/// SQLite implementation of AccessEventRepository
pub struct SqliteAccessEventRepository {
    pool: SqlitePool,
}

impl SqliteAccessEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AccessEventRepository for SqliteAccessEventRepository {
    async fn create(&self, event: &AccessEvent) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO access_events (
                timestamp, identity_id, display_name,
                verdict, distance, reason, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.timestamp)
        .bind(&event.identity_id)
        .bind(&event.display_name)
        .bind(&event.verdict)
        .bind(event.distance)
        .bind(&event.reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessEvent>> {
        let events = sqlx::query_as::<_, AccessEvent>(
            r#"
            SELECT id, timestamp, identity_id, display_name,
                   verdict, distance, reason, created_at
            FROM access_events
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn find_by_identity(
        &self,
        identity_id: &IdentityId,
        limit: i64,
    ) -> StorageResult<Vec<AccessEvent>> {
        let events = sqlx::query_as::<_, AccessEvent>(
            r#"
            SELECT id, timestamp, identity_id, display_name,
                   verdict, distance, reason, created_at
            FROM access_events
            WHERE identity_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(identity_id.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn find_by_verdict(&self, verdict: Verdict, limit: i64) -> StorageResult<Vec<AccessEvent>> {
        let events = sqlx::query_as::<_, AccessEvent>(
            r#"
            SELECT id, timestamp, identity_id, display_name,
                   verdict, distance, reason, created_at
            FROM access_events
            WHERE verdict = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(verdict.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn count_by_verdict(&self, verdict: Verdict, since: DateTime<Utc>) -> StorageResult<i64> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM access_events WHERE verdict = ? AND timestamp >= ?")
                .bind(verdict.as_str())
                .bind(since)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }
}
