//! Discovery pass bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which kind of warm-up pass a run was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    /// Coarse pass over the whole inventory.
    Full,
    /// Fine pass over items first seen since the previous pass.
    Incremental,
}

impl PassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }
}

/// Terminal state of a discovery pass.
///
/// Source timeouts never fail a run; only a hard inventory error does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    Completed,
    Failed,
}

impl DiscoveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Record of one scheduler pass, kept in a bounded recent-history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRun {
    pub id: Uuid,
    pub kind: PassKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items_scanned: u64,
    pub status: DiscoveryStatus,
}
