//! Configuration tree for the resolution engine.

use serde::{Deserialize, Serialize};

/// Default entry time-to-live: 30 days.
pub const DEFAULT_ENTRY_TTL_SECS: u64 = 2_592_000;

/// Default failure-entry time-to-live: 1 day, so a source with no data is
/// retried well before a normal entry would expire.
pub const DEFAULT_FAILURE_TTL_SECS: u64 = 86_400;

/// Default minimum confidence for an answer to reach the durable tier.
pub const DEFAULT_PERSISTENCE_THRESHOLD: u8 = 80;

/// Main configuration structure for eolwatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Cache tiering and TTL configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Source fan-out configuration.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Background warm-up configuration.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cache tiering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Seconds a positive entry lives from creation or verification.
    #[serde(default = "default_entry_ttl_secs")]
    pub entry_ttl_secs: u64,

    /// Seconds a failure entry suppresses repeat dispatch.
    #[serde(default = "default_failure_ttl_secs")]
    pub failure_ttl_secs: u64,

    /// Minimum confidence (0-100) for an answer to be written to the
    /// durable tier; lower answers stay L1-only.
    #[serde(default = "default_persistence_threshold")]
    pub persistence_threshold: u8,
}

const fn default_entry_ttl_secs() -> u64 {
    DEFAULT_ENTRY_TTL_SECS
}

const fn default_failure_ttl_secs() -> u64 {
    DEFAULT_FAILURE_TTL_SECS
}

const fn default_persistence_threshold() -> u8 {
    DEFAULT_PERSISTENCE_THRESHOLD
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_ttl_secs: default_entry_ttl_secs(),
            failure_ttl_secs: default_failure_ttl_secs(),
            persistence_threshold: default_persistence_threshold(),
        }
    }
}

impl CacheConfig {
    /// Positive-entry TTL as a chrono duration.
    pub fn entry_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.entry_ttl_secs as i64)
    }

    /// Failure-entry TTL as a chrono duration.
    pub fn failure_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.failure_ttl_secs as i64)
    }
}

/// Source fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DispatcherConfig {
    /// Per-source wait budget in milliseconds; slower sources are abandoned.
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,

    /// Bounded capacity of the most-recent-first response history.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

const fn default_source_timeout_ms() -> u64 {
    10_000
}

const fn default_history_capacity() -> usize {
    100
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: default_source_timeout_ms(),
            history_capacity: default_history_capacity(),
        }
    }
}

/// Background warm-up configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiscoveryConfig {
    /// Seconds between coarse full passes.
    #[serde(default = "default_full_interval_secs")]
    pub full_interval_secs: u64,

    /// Seconds between fine incremental passes.
    #[serde(default = "default_incremental_interval_secs")]
    pub incremental_interval_secs: u64,

    /// Scheduler tick interval in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Concurrent resolutions per pass.
    #[serde(default = "default_max_concurrent_resolutions")]
    pub max_concurrent_resolutions: usize,

    /// How many recent runs to retain.
    #[serde(default = "default_run_history_capacity")]
    pub run_history_capacity: usize,
}

const fn default_full_interval_secs() -> u64 {
    86_400
}

const fn default_incremental_interval_secs() -> u64 {
    300
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_max_concurrent_resolutions() -> usize {
    4
}

const fn default_run_history_capacity() -> usize {
    20
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            full_interval_secs: default_full_interval_secs(),
            incremental_interval_secs: default_incremental_interval_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            max_concurrent_resolutions: default_max_concurrent_resolutions(),
            run_history_capacity: default_run_history_capacity(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".eolwatch/eolwatch.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling daily log files; stdout when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            directory: None,
        }
    }
}
