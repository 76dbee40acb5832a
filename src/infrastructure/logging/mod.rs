//! Logging initialization using tracing.

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

use crate::domain::models::LoggingConfig;

/// Keeps the non-blocking file writer alive; hold it for the process
/// lifetime.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Initialize the global tracing subscriber from configuration.
///
/// Stdout by default; a configured directory switches to daily-rolling
/// files, always JSON for structured ingestion.
pub fn init(config: &LoggingConfig) -> Result<LogGuard> {
    let default_level = parse_log_level(&config.level)?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    if let Some(directory) = &config.directory {
        let file_appender = rolling::daily(directory, "eolwatch.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(non_blocking)
            .with_ansi(false)
            .try_init()
            .map_err(|e| anyhow!("failed to initialize logging: {e}"))?;
        return Ok(LogGuard { _guard: Some(guard) });
    }

    match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .try_init()
            .map_err(|e| anyhow!("failed to initialize logging: {e}"))?,
        _ => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init()
            .map_err(|e| anyhow!("failed to initialize logging: {e}"))?,
    }
    Ok(LogGuard { _guard: None })
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(anyhow!("invalid log level: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(parse_log_level("loud").is_err());
    }
}
