//! Cache metrics collection.
//!
//! Relaxed atomic increments, read without locking; derived rates live on
//! the snapshot and are always recomputed.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::models::CacheMetrics;

/// Process-lifetime monotonic counters for cache behavior.
///
/// A lookup advances exactly one of the four hit/miss counters: an L1 hit,
/// an L2 hit, a miss that reached the durable tier, or a miss stranded at L1
/// because the durable tier was out of reach. Restart resets counters, not
/// durable contents.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    l1_hits: AtomicU64,
    l1_misses: AtomicU64,
    l2_hits: AtomicU64,
    l2_misses: AtomicU64,
    writes: AtomicU64,
    api_calls_saved: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hit served from the ephemeral tier; one dispatch avoided.
    pub fn record_l1_hit(&self) {
        self.l1_hits.fetch_add(1, Ordering::Relaxed);
        self.api_calls_saved.fetch_add(1, Ordering::Relaxed);
    }

    /// A miss that never reached the durable tier.
    pub fn record_l1_miss(&self) {
        self.l1_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A hit served from the durable tier; one dispatch avoided.
    pub fn record_l2_hit(&self) {
        self.l2_hits.fetch_add(1, Ordering::Relaxed);
        self.api_calls_saved.fetch_add(1, Ordering::Relaxed);
    }

    /// A miss that fell through both tiers.
    pub fn record_l2_miss(&self) {
        self.l2_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// An entry written (put or failure put).
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters.
    pub fn read(&self) -> CacheMetrics {
        CacheMetrics {
            l1_hits: self.l1_hits.load(Ordering::Relaxed),
            l1_misses: self.l1_misses.load(Ordering::Relaxed),
            l2_hits: self.l2_hits.load(Ordering::Relaxed),
            l2_misses: self.l2_misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            api_calls_saved: self.api_calls_saved.load(Ordering::Relaxed),
        }
    }
}
