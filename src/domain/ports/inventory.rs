//! Inventory port - what the discovery scheduler iterates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::InventoryResult;

/// Provider of the raw software inventory the scheduler warms the cache for.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Every known raw item name.
    async fn all(&self) -> InventoryResult<Vec<String>>;

    /// Item names first seen after `since`.
    async fn added_since(&self, since: DateTime<Utc>) -> InventoryResult<Vec<String>>;
}
