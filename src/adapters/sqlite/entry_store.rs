//! SQLite implementation of the EntryStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::{AgentResponse, CacheEntry};
use crate::domain::ports::EntryStore;

#[derive(Clone)]
pub struct SqliteEntryStore {
    pool: SqlitePool,
}

impl SqliteEntryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStore for SqliteEntryStore {
    async fn fetch_best(
        &self,
        cache_key: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<CacheEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(
            r#"SELECT * FROM cache_entries
               WHERE cache_key = ? AND expires_at > ?
               ORDER BY marked_as_failed ASC, verified DESC, confidence_level DESC, created_at DESC
               LIMIT 1"#,
        )
        .bind(cache_key)
        .bind(now.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn insert(&self, entry: &CacheEntry) -> StoreResult<()> {
        let payload = entry
            .response
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"INSERT INTO cache_entries
               (id, cache_key, normalized_name, agent_name, response_payload,
                confidence_level, verified, marked_as_failed, created_at, expires_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.cache_key)
        .bind(&entry.normalized_name)
        .bind(&entry.agent_name)
        .bind(payload)
        .bind(i64::from(entry.confidence_level))
        .bind(i32::from(entry.verified))
        .bind(i32::from(entry.marked_as_failed))
        .bind(entry.created_at.to_rfc3339())
        .bind(entry.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_verified(
        &self,
        cache_key: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<u64> {
        // Conditional on the row still being non-failed so a racing insert
        // cannot be silently lost
        let result = sqlx::query(
            r#"UPDATE cache_entries SET verified = 1, expires_at = ?
               WHERE id IN (
                   SELECT id FROM cache_entries
                   WHERE cache_key = ? AND marked_as_failed = 0 AND expires_at > ?
                   ORDER BY verified DESC, confidence_level DESC, created_at DESC
                   LIMIT 1
               )"#,
        )
        .bind(expires_at.to_rfc3339())
        .bind(cache_key)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_key(&self, cache_key: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE cache_key = ?")
            .bind(cache_key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM cache_entries")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn recent_by_agent(
        &self,
        agent_name: &str,
        limit: u32,
    ) -> StoreResult<Vec<CacheEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT * FROM cache_entries WHERE agent_name = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(agent_name)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn count(&self) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cache_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: String,
    cache_key: String,
    normalized_name: String,
    agent_name: String,
    response_payload: Option<String>,
    confidence_level: i64,
    verified: i32,
    marked_as_failed: i32,
    created_at: String,
    expires_at: String,
}

impl TryFrom<EntryRow> for CacheEntry {
    type Error = StoreError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let id = super::parse_uuid(&row.id)?;
        let created_at = super::parse_datetime(&row.created_at)?;
        let expires_at = super::parse_datetime(&row.expires_at)?;

        let response: Option<AgentResponse> = row
            .response_payload
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(CacheEntry {
            id,
            cache_key: row.cache_key,
            normalized_name: row.normalized_name,
            agent_name: row.agent_name,
            response,
            confidence_level: row.confidence_level.clamp(0, 100) as u8,
            verified: row.verified != 0,
            marked_as_failed: row.marked_as_failed != 0,
            created_at,
            expires_at,
        })
    }
}
