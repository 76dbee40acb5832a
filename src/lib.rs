//! Eolwatch - Lifecycle Resolution & Caching Engine
//!
//! Eolwatch answers "is this software entry still supported, and what is its
//! known lifecycle state" by routing a normalized query to a bounded set of
//! knowledge sources, reconciling their answers into one confidence-scored
//! result, and caching that result across two tiers (ephemeral L1, durable
//! SQLite L2) so repeat queries avoid re-invoking the sources.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, ports, and error taxonomies
//! - **Service Layer** (`services`): The resolution pipeline - normalizer,
//!   selector, dispatcher, cache manager, metrics, discovery scheduler
//! - **Adapters** (`adapters`): SQLite entry store, knowledge-source
//!   adapters, inventory providers
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use eolwatch::adapters::sqlite::{initialize_from_config, SqliteEntryStore};
//! use eolwatch::adapters::sources::{default_selector, default_sources};
//! use eolwatch::{AgentDispatcher, CacheManager, MetricsCollector, ResolutionService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = eolwatch::ConfigLoader::load()?;
//!     let pool = initialize_from_config(&config.database).await?;
//!     let cache = Arc::new(CacheManager::new(
//!         Arc::new(SqliteEntryStore::new(pool)),
//!         Arc::new(MetricsCollector::new()),
//!         config.cache.clone(),
//!     ));
//!     let dispatcher = Arc::new(AgentDispatcher::new(default_sources()?, &config.dispatcher));
//!     let engine = ResolutionService::new(default_selector(), dispatcher, cache);
//!     let resolution = engine.resolve("Ubuntu 22.04 LTS").await;
//!     println!("{resolution:?}");
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AgentResponse, CacheConfig, CacheEntry, CacheMetrics, Config, DatabaseConfig, DiscoveryConfig,
    DiscoveryRun, DiscoveryStatus, DispatcherConfig, LoggingConfig, PassKind, Query, RiskBucket,
};
pub use domain::ports::{EntryStore, InventoryProvider, LifecycleSource};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    normalize, AgentDispatcher, AgentSelector, CacheLookup, CacheManager, ClearScope,
    DiscoveryScheduler, EngineStatus, MetricsCollector, PutOutcome, Resolution, ResolutionService,
    VerifyOutcome,
};
