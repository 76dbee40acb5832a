//! Two-tier cache manager.
//!
//! L1 is an in-process map, L2 a durable store behind the [`EntryStore`]
//! port. Reads check L1 then L2 with write-back promotion; writes are
//! confidence-gated toward L2; failures are negative-cached with a short
//! TTL. Expired entries read as misses in both tiers - deletion belongs to
//! the sweep, never the read path. A single-flight latch guarantees at most
//! one in-flight resolution per key reaches the dispatcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::domain::models::{AgentResponse, CacheConfig, CacheEntry};
use crate::domain::ports::EntryStore;
use crate::services::metrics_collector::MetricsCollector;

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum CacheLookup {
    /// A usable answer.
    Hit(CacheEntry),
    /// A negative entry: resolution recently found no answer, do not
    /// re-dispatch yet.
    Negative(CacheEntry),
    /// Nothing usable in either tier.
    Miss,
}

/// Outcome of a put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Written to both tiers.
    Persisted,
    /// Written to L1 only (sub-threshold confidence or degraded store);
    /// re-resolved after a process restart.
    Ephemeral,
}

/// Outcome of a verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    NotFound,
}

type FlightTable = Arc<Mutex<HashMap<String, watch::Receiver<()>>>>;

/// Single-flight admission result for one key.
pub enum Flight {
    /// This caller resolves; dropping the guard wakes all waiters.
    Lead(FlightGuard),
    /// Another caller is already resolving; wait on its completion signal,
    /// then re-check the cache.
    Wait(watch::Receiver<()>),
}

/// Held by the single in-flight resolver of a key.
///
/// Dropping it removes the key from the in-flight table and closes the
/// completion channel, waking waiters even if the leader panicked.
pub struct FlightGuard {
    key: String,
    table: FlightTable,
    _tx: watch::Sender<()>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Owns both cache tiers and the in-flight resolution table.
pub struct CacheManager {
    l1: RwLock<HashMap<String, CacheEntry>>,
    store: Arc<dyn EntryStore>,
    metrics: Arc<MetricsCollector>,
    config: CacheConfig,
    l2_ready: AtomicBool,
    in_flight: FlightTable,
}

impl CacheManager {
    pub fn new(
        store: Arc<dyn EntryStore>,
        metrics: Arc<MetricsCollector>,
        config: CacheConfig,
    ) -> Self {
        Self {
            l1: RwLock::new(HashMap::new()),
            store,
            metrics,
            config,
            l2_ready: AtomicBool::new(true),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Look a key up, L1 first, then L2 with write-back promotion.
    ///
    /// Every call advances exactly one hit/miss counter, except negative
    /// lookups, which suppress dispatch without being answers.
    pub async fn get(&self, key: &str) -> CacheLookup {
        let now = Utc::now();

        {
            let l1 = self.l1.read().await;
            if let Some(entry) = l1.get(key) {
                if !entry.is_expired(now) {
                    if entry.marked_as_failed {
                        return CacheLookup::Negative(entry.clone());
                    }
                    self.metrics.record_l1_hit();
                    return CacheLookup::Hit(entry.clone());
                }
                // Expired: a miss; the sweep deletes it later
            }
        }

        match self.store.fetch_best(key, now).await {
            Ok(Some(entry)) => {
                self.mark_l2_ready();
                self.l1.write().await.insert(key.to_string(), entry.clone());
                if entry.marked_as_failed {
                    return CacheLookup::Negative(entry);
                }
                self.metrics.record_l2_hit();
                debug!(key = %key, "promoted durable entry into L1");
                CacheLookup::Hit(entry)
            }
            Ok(None) => {
                self.mark_l2_ready();
                self.metrics.record_l2_miss();
                CacheLookup::Miss
            }
            Err(err) => {
                self.degrade(&err);
                self.metrics.record_l1_miss();
                CacheLookup::Miss
            }
        }
    }

    /// L1-only lookup that touches no counters.
    ///
    /// Used for the post-admission double check: any resolution that
    /// completed wrote L1, so a leader that lost the race sees it here.
    pub async fn peek(&self, key: &str) -> CacheLookup {
        let now = Utc::now();
        let l1 = self.l1.read().await;
        match l1.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                if entry.marked_as_failed {
                    CacheLookup::Negative(entry.clone())
                } else {
                    CacheLookup::Hit(entry.clone())
                }
            }
            _ => CacheLookup::Miss,
        }
    }

    /// Store a winning response.
    ///
    /// Always written to L1 so request bursts converge fast; written to L2
    /// only at or above the persistence threshold. A degraded store is
    /// skipped silently and retried on the next natural resolution.
    pub async fn put(
        &self,
        key: &str,
        normalized_name: &str,
        response: AgentResponse,
        verified: bool,
    ) -> PutOutcome {
        let now = Utc::now();
        let confidence = response.confidence_level;
        let entry = CacheEntry::fresh(
            key,
            normalized_name,
            response,
            verified,
            self.config.entry_ttl(),
            now,
        );

        self.metrics.record_write();
        self.l1.write().await.insert(key.to_string(), entry.clone());

        if confidence < self.config.persistence_threshold {
            debug!(key = %key, confidence, "answer below persistence threshold, kept L1-only");
            return PutOutcome::Ephemeral;
        }

        match self.store.insert(&entry).await {
            Ok(()) => {
                self.mark_l2_ready();
                PutOutcome::Persisted
            }
            Err(err) => {
                self.degrade(&err);
                PutOutcome::Ephemeral
            }
        }
    }

    /// Record that resolution found no answer.
    ///
    /// Writes a short-TTL negative entry into both tiers so the key is not
    /// re-dispatched until a sooner retry is due.
    pub async fn put_failure(&self, key: &str, normalized_name: &str) {
        let now = Utc::now();
        let entry = CacheEntry::failed(key, normalized_name, self.config.failure_ttl(), now);

        self.metrics.record_write();
        self.l1.write().await.insert(key.to_string(), entry.clone());

        match self.store.insert(&entry).await {
            Ok(()) => self.mark_l2_ready(),
            Err(err) => self.degrade(&err),
        }
    }

    /// Mark the best non-failed entry for a key as verified and refresh its
    /// TTL in both tiers.
    ///
    /// Verification is the authoritative second pass, so an entry that was
    /// below the persistence threshold is written through to L2 here. The
    /// durable update is conditional and cannot lose against a racing put.
    pub async fn verify(&self, key: &str) -> VerifyOutcome {
        let now = Utc::now();
        let expires_at = now + self.config.entry_ttl();

        let mut l1_entry = None;
        {
            let mut l1 = self.l1.write().await;
            if let Some(entry) = l1.get_mut(key) {
                if !entry.marked_as_failed && !entry.is_expired(now) {
                    entry.verified = true;
                    entry.expires_at = expires_at;
                    l1_entry = Some(entry.clone());
                }
            }
        }

        let l2_rows = match self.store.mark_verified(key, now, expires_at).await {
            Ok(rows) => {
                self.mark_l2_ready();
                rows
            }
            Err(err) => {
                self.degrade(&err);
                0
            }
        };

        if l2_rows == 0 {
            if let Some(entry) = &l1_entry {
                // Fresh row id: the L1 copy's id may already exist durably
                let mut durable = entry.clone();
                durable.id = uuid::Uuid::new_v4();
                if let Err(err) = self.store.insert(&durable).await {
                    self.degrade(&err);
                }
            }
        }

        if l1_entry.is_some() || l2_rows > 0 {
            VerifyOutcome::Verified
        } else {
            VerifyOutcome::NotFound
        }
    }

    /// Remove one key from both tiers. Returns total records purged.
    pub async fn invalidate(&self, key: &str) -> u64 {
        let l1_removed = u64::from(self.l1.write().await.remove(key).is_some());
        let l2_removed = match self.store.delete_key(key).await {
            Ok(rows) => {
                self.mark_l2_ready();
                rows
            }
            Err(err) => {
                self.degrade(&err);
                0
            }
        };
        l1_removed + l2_removed
    }

    /// Clear both tiers. Returns total records purged.
    pub async fn invalidate_all(&self) -> u64 {
        let l1_removed = {
            let mut l1 = self.l1.write().await;
            let count = l1.len() as u64;
            l1.clear();
            count
        };
        let l2_removed = match self.store.delete_all().await {
            Ok(rows) => {
                self.mark_l2_ready();
                rows
            }
            Err(err) => {
                self.degrade(&err);
                0
            }
        };
        l1_removed + l2_removed
    }

    /// Delete expired entries from both tiers. Returns total records removed.
    pub async fn sweep_expired(&self) -> u64 {
        let now = Utc::now();
        let mut removed = {
            let mut l1 = self.l1.write().await;
            let before = l1.len();
            l1.retain(|_, entry| !entry.is_expired(now));
            (before - l1.len()) as u64
        };
        match self.store.prune_expired(now).await {
            Ok(rows) => {
                self.mark_l2_ready();
                removed += rows;
            }
            Err(err) => self.degrade(&err),
        }
        if removed > 0 {
            debug!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Admit a caller into the single-flight slot for a key.
    ///
    /// The first caller leads; concurrent callers for the same key wait on
    /// the leader's completion signal instead of dispatching again.
    pub fn begin_flight(&self, key: &str) -> Flight {
        let mut table = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(rx) = table.get(key) {
            return Flight::Wait(rx.clone());
        }
        let (tx, rx) = watch::channel(());
        table.insert(key.to_string(), rx);
        Flight::Lead(FlightGuard {
            key: key.to_string(),
            table: Arc::clone(&self.in_flight),
            _tx: tx,
        })
    }

    /// Most recent durable entries written by one source, newest first.
    pub async fn recent_from_source(
        &self,
        agent_name: &str,
        limit: u32,
    ) -> Vec<CacheEntry> {
        match self.store.recent_by_agent(agent_name, limit).await {
            Ok(entries) => {
                self.mark_l2_ready();
                entries
            }
            Err(err) => {
                self.degrade(&err);
                Vec::new()
            }
        }
    }

    /// Current L1 entry counts: (total, negative).
    pub async fn l1_counts(&self) -> (u64, u64) {
        let l1 = self.l1.read().await;
        let negative = l1.values().filter(|entry| entry.marked_as_failed).count() as u64;
        (l1.len() as u64, negative)
    }

    /// Whether the durable tier answered its last operation.
    pub fn l2_ready(&self) -> bool {
        self.l2_ready.load(Ordering::Relaxed)
    }

    /// Metrics handle shared with the collector.
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    fn mark_l2_ready(&self) {
        if !self.l2_ready.swap(true, Ordering::Relaxed) {
            info!("durable tier recovered");
        }
    }

    fn degrade(&self, err: &crate::domain::errors::StoreError) {
        if self.l2_ready.swap(false, Ordering::Relaxed) {
            warn!(error = %err, "durable tier unavailable, continuing L1-only");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteEntryStore};
    use crate::domain::models::AgentResponse;
    use chrono::NaiveDate;
    use sqlx::SqlitePool;

    fn response(agent: &str, confidence: u8) -> AgentResponse {
        AgentResponse {
            agent_name: agent.to_string(),
            cycle: "22.04".to_string(),
            eol_date: NaiveDate::from_ymd_opt(2027, 4, 1),
            latest_version: "22.04.5".to_string(),
            is_lts: true,
            confidence_level: confidence,
            fetched_at: Utc::now(),
        }
    }

    async fn test_pool() -> SqlitePool {
        create_migrated_test_pool().await.unwrap()
    }

    fn manager_over(pool: &SqlitePool, config: CacheConfig) -> CacheManager {
        CacheManager::new(
            Arc::new(SqliteEntryStore::new(pool.clone())),
            Arc::new(MetricsCollector::new()),
            config,
        )
    }

    #[tokio::test]
    async fn test_sub_threshold_put_is_l1_only() {
        let pool = test_pool().await;
        let cache = manager_over(&pool, CacheConfig::default());

        let outcome = cache.put("app@1", "app", response("src", 79), false).await;
        assert_eq!(outcome, PutOutcome::Ephemeral);
        assert!(matches!(cache.get("app@1").await, CacheLookup::Hit(_)));

        // Simulated restart: a fresh manager over the same durable store
        let restarted = manager_over(&pool, CacheConfig::default());
        assert!(matches!(restarted.get("app@1").await, CacheLookup::Miss));
    }

    #[tokio::test]
    async fn test_threshold_put_survives_restart() {
        let pool = test_pool().await;
        let cache = manager_over(&pool, CacheConfig::default());

        let outcome = cache.put("app@1", "app", response("src", 80), false).await;
        assert_eq!(outcome, PutOutcome::Persisted);

        let restarted = manager_over(&pool, CacheConfig::default());
        match restarted.get("app@1").await {
            CacheLookup::Hit(entry) => assert_eq!(entry.confidence_level, 80),
            other => panic!("expected durable hit, got {other:?}"),
        }
        // The hit was served by L2 and promoted
        let metrics = restarted.metrics().read();
        assert_eq!(metrics.l2_hits, 1);
        assert_eq!(metrics.api_calls_saved, 1);
        // Promoted: the next read is an L1 hit
        assert!(matches!(restarted.get("app@1").await, CacheLookup::Hit(_)));
        assert_eq!(restarted.metrics().read().l1_hits, 1);
    }

    #[tokio::test]
    async fn test_negative_entry_suppresses_and_expires() {
        let pool = test_pool().await;
        let cache = manager_over(&pool, CacheConfig::default());

        cache.put_failure("ghost", "ghost").await;
        assert!(matches!(cache.get("ghost").await, CacheLookup::Negative(_)));

        // Zero failure TTL: the negative entry is born expired
        let config = CacheConfig { failure_ttl_secs: 0, ..CacheConfig::default() };
        let cache = manager_over(&test_pool().await, config);
        cache.put_failure("ghost", "ghost").await;
        assert!(matches!(cache.get("ghost").await, CacheLookup::Miss));
    }

    #[tokio::test]
    async fn test_negative_entry_survives_restart() {
        let pool = test_pool().await;
        let cache = manager_over(&pool, CacheConfig::default());
        cache.put_failure("ghost", "ghost").await;

        let restarted = manager_over(&pool, CacheConfig::default());
        assert!(matches!(restarted.get("ghost").await, CacheLookup::Negative(_)));
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss_until_swept() {
        let pool = test_pool().await;
        let config = CacheConfig { entry_ttl_secs: 0, ..CacheConfig::default() };
        let cache = manager_over(&pool, config);

        cache.put("app@1", "app", response("src", 90), false).await;
        assert!(matches!(cache.get("app@1").await, CacheLookup::Miss));

        // The read path deleted nothing
        let (l1_total, _) = cache.l1_counts().await;
        assert_eq!(l1_total, 1);

        let removed = cache.sweep_expired().await;
        assert_eq!(removed, 2); // one L1 entry, one durable row
        let (l1_total, _) = cache.l1_counts().await;
        assert_eq!(l1_total, 0);
    }

    #[tokio::test]
    async fn test_verify_flips_and_refreshes() {
        let pool = test_pool().await;
        let cache = manager_over(&pool, CacheConfig::default());

        cache.put("app@1", "app", response("src", 90), false).await;
        assert_eq!(cache.verify("app@1").await, VerifyOutcome::Verified);

        match cache.get("app@1").await {
            CacheLookup::Hit(entry) => assert!(entry.verified),
            other => panic!("expected hit, got {other:?}"),
        }
        // And the durable row was updated too
        let restarted = manager_over(&pool, CacheConfig::default());
        match restarted.get("app@1").await {
            CacheLookup::Hit(entry) => assert!(entry.verified),
            other => panic!("expected durable hit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_persists_sub_threshold_entry() {
        let pool = test_pool().await;
        let cache = manager_over(&pool, CacheConfig::default());

        cache.put("app@1", "app", response("src", 60), false).await;
        assert_eq!(cache.verify("app@1").await, VerifyOutcome::Verified);

        // Verification wrote the entry through to the durable tier
        let restarted = manager_over(&pool, CacheConfig::default());
        match restarted.get("app@1").await {
            CacheLookup::Hit(entry) => {
                assert!(entry.verified);
                assert_eq!(entry.confidence_level, 60);
            }
            other => panic!("expected durable hit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_missing_key_is_not_found() {
        let cache = manager_over(&test_pool().await, CacheConfig::default());
        assert_eq!(cache.verify("nope").await, VerifyOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_verify_failed_entry_is_not_found() {
        let cache = manager_over(&test_pool().await, CacheConfig::default());
        cache.put_failure("ghost", "ghost").await;
        assert_eq!(cache.verify("ghost").await, VerifyOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_invalidate_counts_both_tiers() {
        let pool = test_pool().await;
        let cache = manager_over(&pool, CacheConfig::default());

        cache.put("app@1", "app", response("src", 90), false).await;
        assert_eq!(cache.invalidate("app@1").await, 2);
        assert!(matches!(cache.get("app@1").await, CacheLookup::Miss));
        assert_eq!(cache.invalidate("app@1").await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let pool = test_pool().await;
        let cache = manager_over(&pool, CacheConfig::default());

        cache.put("a", "a", response("src", 90), false).await;
        cache.put("b", "b", response("src", 50), false).await;
        // a in both tiers, b in L1 only
        assert_eq!(cache.invalidate_all().await, 3);
    }

    #[tokio::test]
    async fn test_single_flight_one_leader() {
        let cache = manager_over(&test_pool().await, CacheConfig::default());

        let Flight::Lead(guard) = cache.begin_flight("k") else {
            panic!("first caller should lead");
        };
        assert!(matches!(cache.begin_flight("k"), Flight::Wait(_)));
        // Different key gets its own slot
        assert!(matches!(cache.begin_flight("other"), Flight::Lead(_)));

        drop(guard);
        assert!(matches!(cache.begin_flight("k"), Flight::Lead(_)));
    }

    #[tokio::test]
    async fn test_flight_guard_drop_wakes_waiters() {
        let cache = Arc::new(manager_over(&test_pool().await, CacheConfig::default()));

        let Flight::Lead(guard) = cache.begin_flight("k") else {
            panic!("first caller should lead");
        };
        let Flight::Wait(mut rx) = cache.begin_flight("k") else {
            panic!("second caller should wait");
        };

        let waiter = tokio::spawn(async move {
            let _ = rx.changed().await;
        });
        drop(guard);
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake after guard drop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_recent_from_source() {
        let pool = test_pool().await;
        let cache = manager_over(&pool, CacheConfig::default());

        cache.put("a", "a", response("canonical", 90), false).await;
        cache.put("b", "b", response("canonical", 95), false).await;
        cache.put("c", "c", response("microsoft", 90), false).await;

        let recent = cache.recent_from_source("canonical", 10).await;
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|entry| entry.agent_name == "canonical"));
    }
}
