//! Cache entries as stored in both tiers.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::response::AgentResponse;

/// One cached resolution result.
///
/// Positive entries carry the chosen `AgentResponse` as payload. Failed
/// entries (`marked_as_failed`) carry no payload and exist only to suppress
/// repeat dispatch until their short TTL elapses. A plain read never mutates
/// an entry: `verified` flips only through an explicit verify call, and
/// expired rows are removed by the sweep, not the read path.
///
/// The durable tier keeps one row per write (answer history per key and per
/// source), so entries carry a surrogate `id` and reads pick the best row.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Surrogate row identity in the durable tier.
    pub id: Uuid,
    /// Deterministic key derived from the normalized query.
    pub cache_key: String,
    /// Normalized product name the entry answers for.
    pub normalized_name: String,
    /// Source that produced the payload, or [`FAILED_AGENT_NAME`].
    pub agent_name: String,
    /// The winning answer; `None` for failed entries.
    pub response: Option<AgentResponse>,
    /// Confidence of the payload at write time, 0-100.
    pub confidence_level: u8,
    /// Whether a later, authoritative pass confirmed the answer.
    pub verified: bool,
    /// Negative-cache marker: resolution found no answer.
    pub marked_as_failed: bool,
    /// Write time.
    pub created_at: DateTime<Utc>,
    /// `created_at` + TTL at write time, refreshed by verify.
    pub expires_at: DateTime<Utc>,
}

/// Agent identity recorded on failed (negative) entries.
pub const FAILED_AGENT_NAME: &str = "none";

impl CacheEntry {
    /// Build a positive entry from a winning response.
    pub fn fresh(
        cache_key: &str,
        normalized_name: &str,
        response: AgentResponse,
        verified: bool,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cache_key: cache_key.to_string(),
            normalized_name: normalized_name.to_string(),
            agent_name: response.agent_name.clone(),
            confidence_level: response.confidence_level,
            response: Some(response),
            verified,
            marked_as_failed: false,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Build a negative entry recording that resolution found no answer.
    pub fn failed(
        cache_key: &str,
        normalized_name: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cache_key: cache_key.to_string(),
            normalized_name: normalized_name.to_string(),
            agent_name: FAILED_AGENT_NAME.to_string(),
            response: None,
            confidence_level: 0,
            verified: false,
            marked_as_failed: true,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Whether the entry's TTL has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
