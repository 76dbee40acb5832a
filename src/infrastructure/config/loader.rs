use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid persistence_threshold: {0}. Must be between 0 and 100")]
    InvalidPersistenceThreshold(u8),

    #[error("Invalid entry_ttl_secs: {0}. Must be positive")]
    InvalidEntryTtl(u64),

    #[error(
        "Invalid failure_ttl_secs: {0}. Must be shorter than entry_ttl_secs ({1})"
    )]
    InvalidFailureTtl(u64, u64),

    #[error("Invalid source_timeout_ms: {0}. Must be positive")]
    InvalidSourceTimeout(u64),

    #[error("Invalid discovery interval: {0}. Must be positive")]
    InvalidDiscoveryInterval(u64),

    #[error("Invalid max_concurrent_resolutions: {0}. Must be at least 1")]
    InvalidMaxConcurrentResolutions(usize),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .eolwatch/config.yaml (project config)
    /// 3. .eolwatch/local.yaml (project local overrides, optional)
    /// 4. Environment variables (EOLWATCH_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".eolwatch/config.yaml"))
            .merge(Yaml::file(".eolwatch/local.yaml"))
            .merge(Env::prefixed("EOLWATCH_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.cache.persistence_threshold > 100 {
            return Err(ConfigError::InvalidPersistenceThreshold(
                config.cache.persistence_threshold,
            ));
        }

        if config.cache.entry_ttl_secs == 0 {
            return Err(ConfigError::InvalidEntryTtl(config.cache.entry_ttl_secs));
        }

        // Failure entries must retry sooner than a normal TTL would allow
        if config.cache.failure_ttl_secs >= config.cache.entry_ttl_secs {
            return Err(ConfigError::InvalidFailureTtl(
                config.cache.failure_ttl_secs,
                config.cache.entry_ttl_secs,
            ));
        }

        if config.dispatcher.source_timeout_ms == 0 {
            return Err(ConfigError::InvalidSourceTimeout(
                config.dispatcher.source_timeout_ms,
            ));
        }

        if config.discovery.full_interval_secs == 0 {
            return Err(ConfigError::InvalidDiscoveryInterval(
                config.discovery.full_interval_secs,
            ));
        }

        if config.discovery.incremental_interval_secs == 0 {
            return Err(ConfigError::InvalidDiscoveryInterval(
                config.discovery.incremental_interval_secs,
            ));
        }

        if config.discovery.max_concurrent_resolutions == 0 {
            return Err(ConfigError::InvalidMaxConcurrentResolutions(
                config.discovery.max_concurrent_resolutions,
            ));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CacheConfig, LoggingConfig};
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(ConfigLoader::validate(&config).is_ok());
        assert_eq!(config.cache.persistence_threshold, 80);
        assert_eq!(config.cache.entry_ttl_secs, 2_592_000);
    }

    #[test]
    fn test_failure_ttl_must_be_shorter_than_entry_ttl() {
        let config = Config {
            cache: CacheConfig {
                failure_ttl_secs: CacheConfig::default().entry_ttl_secs,
                ..CacheConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidFailureTtl(_, _))
        ));
    }

    #[test]
    fn test_threshold_over_100_rejected() {
        let config = Config {
            cache: CacheConfig {
                persistence_threshold: 101,
                ..CacheConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidPersistenceThreshold(101))
        ));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let config = Config {
            logging: LoggingConfig {
                level: "loud".to_string(),
                ..LoggingConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "cache:\n  persistence_threshold: 85\ndispatcher:\n  source_timeout_ms: 2500"
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.cache.persistence_threshold, 85);
        assert_eq!(config.dispatcher.source_timeout_ms, 2500);
        // Untouched sections keep their defaults
        assert_eq!(config.cache.entry_ttl_secs, 2_592_000);
    }
}
