//! Domain models for the eolwatch resolution engine.

pub mod config;
pub mod discovery;
pub mod entry;
pub mod metrics;
pub mod query;
pub mod response;

pub use config::{
    CacheConfig, Config, DatabaseConfig, DiscoveryConfig, DispatcherConfig, LoggingConfig,
    DEFAULT_ENTRY_TTL_SECS, DEFAULT_FAILURE_TTL_SECS, DEFAULT_PERSISTENCE_THRESHOLD,
};
pub use discovery::{DiscoveryRun, DiscoveryStatus, PassKind};
pub use entry::{CacheEntry, FAILED_AGENT_NAME};
pub use metrics::{CacheMetrics, RiskBucket};
pub use query::Query;
pub use response::AgentResponse;
