//! Entry store port - the durable (L2) cache tier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::StoreResult;
use crate::domain::models::CacheEntry;

/// Durable cross-process cache tier.
///
/// The store keeps one row per write (answer history per key and per
/// source); reads select the best row for a key. Expired rows are filtered
/// by reads and removed by `prune_expired`, never by the read path itself.
/// The store is accessed without client-side locking; `mark_verified` must
/// be conditional so it cannot silently lose against a racing insert.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Best non-expired row for a key: non-failed before failed, verified
    /// before unverified, then highest confidence, then newest.
    async fn fetch_best(&self, cache_key: &str, now: DateTime<Utc>)
        -> StoreResult<Option<CacheEntry>>;

    /// Append one entry row.
    async fn insert(&self, entry: &CacheEntry) -> StoreResult<()>;

    /// Flip `verified` on the best non-failed, non-expired row for the key
    /// and refresh its expiry. Returns the number of rows updated (0 or 1).
    async fn mark_verified(
        &self,
        cache_key: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<u64>;

    /// Delete all rows for a key. Returns the number of rows removed.
    async fn delete_key(&self, cache_key: &str) -> StoreResult<u64>;

    /// Delete every row. Returns the number of rows removed.
    async fn delete_all(&self) -> StoreResult<u64>;

    /// Delete rows whose TTL has elapsed. Returns the number removed.
    async fn prune_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Most recent rows written by a given source, newest first.
    async fn recent_by_agent(&self, agent_name: &str, limit: u32)
        -> StoreResult<Vec<CacheEntry>>;

    /// Total row count.
    async fn count(&self) -> StoreResult<u64>;
}
