//! In-memory inventory provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::errors::InventoryResult;
use crate::domain::ports::InventoryProvider;

/// Simple inventory held in memory, with first-seen timestamps so the
/// incremental discovery pass can scan only new items.
#[derive(Debug, Default)]
pub struct StaticInventory {
    items: RwLock<Vec<(String, DateTime<Utc>)>>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an inventory, all items first seen now.
    pub fn from_items(items: impl IntoIterator<Item = String>) -> Self {
        let now = Utc::now();
        Self {
            items: RwLock::new(items.into_iter().map(|item| (item, now)).collect()),
        }
    }

    /// Add an item if it is not already present.
    pub async fn add(&self, item: &str) {
        let mut items = self.items.write().await;
        if !items.iter().any(|(existing, _)| existing == item) {
            items.push((item.to_string(), Utc::now()));
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl InventoryProvider for StaticInventory {
    async fn all(&self) -> InventoryResult<Vec<String>> {
        Ok(self.items.read().await.iter().map(|(item, _)| item.clone()).collect())
    }

    async fn added_since(&self, since: DateTime<Utc>) -> InventoryResult<Vec<String>> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|(_, first_seen)| *first_seen > since)
            .map(|(item, _)| item.clone())
            .collect())
    }
}
