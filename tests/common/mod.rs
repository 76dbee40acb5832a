//! Common test utilities for integration tests
//!
//! Builds fully wired engines over mock sources and in-memory migrated
//! pools so each test gets an isolated instance.

use std::sync::Arc;

use sqlx::SqlitePool;

use eolwatch::adapters::sources::MockSource;
use eolwatch::adapters::sqlite::{create_migrated_test_pool, SqliteEntryStore};
use eolwatch::domain::ports::LifecycleSource;
use eolwatch::services::selector::{AgentSelector, FALLBACK_SOURCE_ID};
use eolwatch::{
    AgentDispatcher, CacheConfig, CacheManager, DispatcherConfig, MetricsCollector,
    ResolutionService,
};

/// A wired engine plus handles the tests inspect.
pub struct TestEngine {
    pub service: Arc<ResolutionService>,
    pub cache: Arc<CacheManager>,
}

/// In-memory migrated pool.
pub async fn migrated_pool() -> SqlitePool {
    create_migrated_test_pool().await.expect("Failed to create test pool")
}

/// Wire an engine over the given pool, sources, and selector.
pub fn engine_over(
    pool: &SqlitePool,
    sources: Vec<(&str, Arc<MockSource>)>,
    selector: AgentSelector,
    cache_config: CacheConfig,
) -> TestEngine {
    let dispatcher_sources: Vec<(String, Arc<dyn LifecycleSource>)> = sources
        .into_iter()
        .map(|(id, source)| (id.to_string(), source as Arc<dyn LifecycleSource>))
        .collect();

    let cache = Arc::new(CacheManager::new(
        Arc::new(SqliteEntryStore::new(pool.clone())),
        Arc::new(MetricsCollector::new()),
        cache_config,
    ));
    let dispatcher = Arc::new(AgentDispatcher::new(
        dispatcher_sources,
        &DispatcherConfig {
            source_timeout_ms: 1000,
            history_capacity: 100,
        },
    ));
    let service = Arc::new(ResolutionService::new(
        selector,
        dispatcher,
        Arc::clone(&cache),
    ));

    TestEngine { service, cache }
}

/// Selector with no vendor rules: everything goes to the fallback source.
pub fn fallback_only_selector() -> AgentSelector {
    AgentSelector::new(Vec::new())
}

/// The fallback source id, re-exported for readability.
pub const FALLBACK: &str = FALLBACK_SOURCE_ID;
