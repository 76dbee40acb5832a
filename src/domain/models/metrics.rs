//! Cache metrics snapshot and expiry risk bucketing.

use serde::{Deserialize, Serialize};

/// Snapshot of the monotonic cache counters.
///
/// Every lookup advances exactly one of the four hit/miss counters, so the
/// derived rates stay exact. Counters are process-lifetime; rates are
/// recomputed on every call and never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetrics {
    /// Hits served from the ephemeral tier.
    pub l1_hits: u64,
    /// Lookups that missed with the durable tier out of reach.
    pub l1_misses: u64,
    /// Hits served from the durable tier (promoted on read).
    pub l2_hits: u64,
    /// Lookups that missed both tiers.
    pub l2_misses: u64,
    /// Entries written (puts and failure puts).
    pub writes: u64,
    /// Dispatcher invocations avoided, one per L1 or L2 hit.
    pub api_calls_saved: u64,
}

impl CacheMetrics {
    /// `l1_hits / (l1_hits + l1_misses)`, or 0 with no lookups.
    pub fn l1_hit_rate(&self) -> f64 {
        rate(self.l1_hits, self.l1_hits + self.l1_misses)
    }

    /// `l2_hits / (l2_hits + l2_misses)`, or 0 with no lookups.
    pub fn l2_hit_rate(&self) -> f64 {
        rate(self.l2_hits, self.l2_hits + self.l2_misses)
    }

    /// Hits across both tiers over all four counters.
    pub fn overall_hit_rate(&self) -> f64 {
        rate(
            self.l1_hits + self.l2_hits,
            self.l1_hits + self.l1_misses + self.l2_hits + self.l2_misses,
        )
    }

    /// Complement of [`overall_hit_rate`](Self::overall_hit_rate).
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.overall_hit_rate()
    }
}

fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Consumer-side urgency classification of an expiry date.
///
/// Never stored; computed from the days remaining at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBucket {
    /// At most 90 days left, including already past.
    Critical,
    /// At most a year left.
    High,
    /// At most two years left.
    Medium,
    /// More than two years left.
    Low,
    /// No expiry date is known.
    Unknown,
}

impl RiskBucket {
    /// Bucket a `days = expiry_date - now` distance.
    pub fn from_days_until(days: Option<i64>) -> Self {
        match days {
            None => Self::Unknown,
            Some(d) if d <= 90 => Self::Critical,
            Some(d) if d <= 365 => Self::High,
            Some(d) if d <= 730 => Self::Medium,
            Some(_) => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}
