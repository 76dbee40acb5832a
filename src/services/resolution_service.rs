//! Resolution service: the engine's four core operations.
//!
//! Composes the normalizer, selector, dispatcher, and cache manager into
//! `resolve` / `clear` / `status` / `verify`. Nothing here is fatal to the
//! host: source failures become negative results, a degraded durable tier
//! falls back to L1-only resolution, and malformed input yields a typed
//! unresolvable result instead of an error.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::models::{AgentResponse, CacheEntry, CacheMetrics};
use crate::services::cache_manager::{CacheLookup, CacheManager, Flight, VerifyOutcome};
use crate::services::dispatcher::AgentDispatcher;
use crate::services::normalizer::normalize;
use crate::services::selector::AgentSelector;

/// Result of one resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A source answered, now or earlier.
    Resolved {
        /// The winning answer.
        answer: AgentResponse,
        /// Confidence of the answer at write time.
        confidence: u8,
        /// Whether an authoritative pass confirmed the answer.
        verified: bool,
        /// Whether the answer came from the cache.
        cached: bool,
    },
    /// No source had an answer; negative-cached until the short TTL lapses.
    NoAnswer {
        /// Whether the negative result came from the cache.
        cached: bool,
    },
    /// The raw text normalized to nothing usable.
    Unresolvable {
        /// The offending input.
        raw_text: String,
    },
}

/// Scope of a clear operation.
#[derive(Debug, Clone)]
pub enum ClearScope {
    /// One cache key.
    Key(String),
    /// Everything, both tiers.
    All,
}

/// Snapshot returned by `status`.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    /// Entries currently held in L1.
    pub l1_entries: u64,
    /// Negative entries currently held in L1.
    pub l1_negative_entries: u64,
    /// Whether the durable tier answered its last operation.
    pub l2_ready: bool,
    /// Counter snapshot.
    pub metrics: CacheMetrics,
}

/// The resolution-and-caching engine.
///
/// Explicitly constructed and passed by reference so isolated instances can
/// coexist in tests; no module-level state.
pub struct ResolutionService {
    selector: AgentSelector,
    dispatcher: Arc<AgentDispatcher>,
    cache: Arc<CacheManager>,
}

impl ResolutionService {
    pub fn new(
        selector: AgentSelector,
        dispatcher: Arc<AgentDispatcher>,
        cache: Arc<CacheManager>,
    ) -> Self {
        Self {
            selector,
            dispatcher,
            cache,
        }
    }

    /// Resolve raw text to a lifecycle answer.
    ///
    /// Cache first; on a miss, at most one caller per key dispatches to the
    /// selected sources while concurrent callers wait on its result.
    #[instrument(skip_all, fields(raw = %raw_text))]
    pub async fn resolve(&self, raw_text: &str) -> Resolution {
        let query = normalize(raw_text);
        if query.normalized_name.is_empty() {
            debug!("input normalized to an empty name");
            return Resolution::Unresolvable {
                raw_text: raw_text.to_string(),
            };
        }
        let key = query.cache_key();

        loop {
            match self.cache.get(&key).await {
                CacheLookup::Hit(entry) => return Self::from_entry(entry, true),
                CacheLookup::Negative(_) => return Resolution::NoAnswer { cached: true },
                CacheLookup::Miss => {}
            }

            match self.cache.begin_flight(&key) {
                Flight::Lead(guard) => {
                    // Another caller may have finished between the miss and
                    // winning the flight slot
                    match self.cache.peek(&key).await {
                        CacheLookup::Hit(entry) => return Self::from_entry(entry, true),
                        CacheLookup::Negative(_) => return Resolution::NoAnswer { cached: true },
                        CacheLookup::Miss => {}
                    }

                    let selected = self.selector.select(&query.normalized_name);
                    let winner = self.dispatcher.resolve(&query, &selected).await;
                    let resolution = match winner {
                        Some(answer) => {
                            let confidence = answer.confidence_level;
                            self.cache
                                .put(&key, &query.normalized_name, answer.clone(), false)
                                .await;
                            Resolution::Resolved {
                                answer,
                                confidence,
                                verified: false,
                                cached: false,
                            }
                        }
                        None => {
                            self.cache.put_failure(&key, &query.normalized_name).await;
                            Resolution::NoAnswer { cached: false }
                        }
                    };
                    drop(guard);
                    return resolution;
                }
                Flight::Wait(mut rx) => {
                    // Leader finished when the channel closes; re-check the cache
                    let _ = rx.changed().await;
                }
            }
        }
    }

    /// Clear cached entries. Returns total records purged.
    pub async fn clear(&self, scope: ClearScope) -> u64 {
        match scope {
            ClearScope::Key(key) => self.cache.invalidate(&key).await,
            ClearScope::All => self.cache.invalidate_all().await,
        }
    }

    /// Current cache health and counters.
    pub async fn status(&self) -> EngineStatus {
        let (l1_entries, l1_negative_entries) = self.cache.l1_counts().await;
        EngineStatus {
            l1_entries,
            l1_negative_entries,
            l2_ready: self.cache.l2_ready(),
            metrics: self.cache.metrics().read(),
        }
    }

    /// Mark the cached answer for a key as verified.
    pub async fn verify(&self, cache_key: &str) -> VerifyOutcome {
        self.cache.verify(cache_key).await
    }

    /// The dispatcher, for response-history inspection.
    pub fn dispatcher(&self) -> &Arc<AgentDispatcher> {
        &self.dispatcher
    }

    fn from_entry(entry: CacheEntry, cached: bool) -> Resolution {
        match entry.response {
            Some(answer) => Resolution::Resolved {
                confidence: entry.confidence_level,
                verified: entry.verified,
                answer,
                cached,
            },
            // A positive entry always carries a payload; treat anything else
            // as a negative result
            None => Resolution::NoAnswer { cached },
        }
    }
}
