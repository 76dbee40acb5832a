//! HTTP lifecycle source backed by the endoflife.date cycle API.
//!
//! One adapter type serves both roles: vendor-specialized instances carry a
//! slug table mapping product keywords onto API slugs and report high
//! confidence, while the generic fallback instance guesses the slug from the
//! product name and reports lower confidence.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::domain::errors::{SourceError, SourceResult};
use crate::domain::models::AgentResponse;
use crate::domain::ports::LifecycleSource;

/// Public cycle API base.
pub const DEFAULT_BASE_URL: &str = "https://endoflife.date/api";

/// Confidence penalty when a requested version matched no known cycle and
/// the newest cycle was answered instead.
const UNMATCHED_CYCLE_PENALTY: u8 = 10;

/// Configuration for one adapter instance.
#[derive(Debug, Clone)]
pub struct EndOfLifeSourceConfig {
    /// Source identity recorded on responses.
    pub name: String,
    /// API base URL; override in tests.
    pub base_url: String,
    /// Product keyword to API slug. Empty for the generic fallback.
    pub slugs: HashMap<String, String>,
    /// Confidence when the slug came from the table.
    pub match_confidence: u8,
    /// Confidence when the slug was guessed from the name.
    pub guess_confidence: u8,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl EndOfLifeSourceConfig {
    /// Generic fallback over the public API: no slug table, lower trust.
    pub fn fallback(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            slugs: HashMap::new(),
            match_confidence: 70,
            guess_confidence: 70,
            timeout_secs: 10,
        }
    }

    /// Vendor-specialized instance with a slug table.
    pub fn specialized(name: &str, slugs: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            slugs: slugs
                .iter()
                .map(|(keyword, slug)| (keyword.to_string(), slug.to_string()))
                .collect(),
            match_confidence: 90,
            guess_confidence: 60,
            timeout_secs: 10,
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Lifecycle source over the endoflife.date cycle API.
pub struct EndOfLifeHttpSource {
    config: EndOfLifeSourceConfig,
    client: ReqwestClient,
}

impl EndOfLifeHttpSource {
    pub fn new(config: EndOfLifeSourceConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, client })
    }

    /// Map a normalized name to an API slug, preferring the slug table.
    ///
    /// Returns the slug and whether it came from the table.
    fn slug_for(&self, normalized_name: &str) -> (String, bool) {
        if let Some(slug) = self.config.slugs.get(normalized_name) {
            return (slug.clone(), true);
        }
        // Longest matching keyword wins so "windows server" beats "windows"
        if let Some((_, slug)) = self
            .config
            .slugs
            .iter()
            .filter(|(keyword, _)| normalized_name.contains(keyword.as_str()))
            .max_by_key(|(keyword, _)| keyword.len())
        {
            return (slug.clone(), true);
        }
        // endoflife.date slug convention: lowercase, hyphen-separated
        (normalized_name.replace(' ', "-"), false)
    }
}

#[async_trait]
impl LifecycleSource for EndOfLifeHttpSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn query(
        &self,
        normalized_name: &str,
        normalized_version: Option<&str>,
    ) -> SourceResult<Option<AgentResponse>> {
        let (slug, from_table) = self.slug_for(normalized_name);
        let url = format!("{}/{}.json", self.config.base_url, slug);

        let response = self.client.get(&url).send().await.map_err(|err| {
            if err.is_timeout() {
                SourceError::Timeout(self.config.timeout_secs * 1000)
            } else {
                SourceError::Request(err.to_string())
            }
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(slug = %slug, "product unknown to the cycle API");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SourceError::Request(format!(
                "unexpected status {} for {url}",
                response.status()
            )));
        }

        let cycles: Vec<CycleRow> = response
            .json()
            .await
            .map_err(|err| SourceError::Malformed(err.to_string()))?;
        if cycles.is_empty() {
            return Ok(None);
        }

        // Rows come newest first; prefer the cycle the caller asked about
        let (row, cycle_matched) = match normalized_version {
            Some(version) => match cycles.iter().find(|row| row.matches(version)) {
                Some(row) => (row, true),
                None => (&cycles[0], false),
            },
            None => (&cycles[0], true),
        };

        let base = if from_table {
            self.config.match_confidence
        } else {
            self.config.guess_confidence
        };
        let confidence_level = if cycle_matched {
            base
        } else {
            base.saturating_sub(UNMATCHED_CYCLE_PENALTY)
        };

        let cycle = row.cycle_string();
        Ok(Some(AgentResponse {
            agent_name: self.config.name.clone(),
            eol_date: row.eol_date(),
            latest_version: row.latest.clone().unwrap_or_else(|| cycle.clone()),
            is_lts: row.is_lts(),
            cycle,
            confidence_level,
            fetched_at: Utc::now(),
        }))
    }
}

/// One cycle from the API. `eol` and `lts` are booleans or date strings,
/// `cycle` a string or number, depending on the product.
#[derive(Debug, Deserialize)]
struct CycleRow {
    #[serde(default)]
    cycle: Option<serde_json::Value>,
    #[serde(default)]
    eol: Option<serde_json::Value>,
    #[serde(default)]
    latest: Option<String>,
    #[serde(default)]
    lts: Option<serde_json::Value>,
}

impl CycleRow {
    fn cycle_string(&self) -> String {
        match &self.cycle {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Whether a requested version belongs to this cycle.
    fn matches(&self, version: &str) -> bool {
        let cycle = self.cycle_string();
        !cycle.is_empty() && (cycle == version || version.starts_with(&format!("{cycle}.")))
    }

    fn eol_date(&self) -> Option<NaiveDate> {
        match &self.eol {
            Some(serde_json::Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    fn is_lts(&self) -> bool {
        match &self.lts {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UBUNTU_CYCLES: &str = r#"[
        {"cycle": "24.04", "eol": "2029-05-31", "latest": "24.04.1", "lts": true},
        {"cycle": "23.10", "eol": "2024-07-11", "latest": "23.10", "lts": false},
        {"cycle": "22.04", "eol": "2027-04-01", "latest": "22.04.5", "lts": true}
    ]"#;

    fn source_against(server: &mockito::ServerGuard) -> EndOfLifeHttpSource {
        let config = EndOfLifeSourceConfig::specialized("canonical", &[("ubuntu", "ubuntu")])
            .with_base_url(&server.url());
        EndOfLifeHttpSource::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_version_selects_matching_cycle() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ubuntu.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(UBUNTU_CYCLES)
            .create_async()
            .await;

        let source = source_against(&server);
        let answer = source.query("ubuntu", Some("22.04")).await.unwrap().unwrap();

        assert_eq!(answer.cycle, "22.04");
        assert_eq!(answer.latest_version, "22.04.5");
        assert!(answer.is_lts);
        assert_eq!(answer.eol_date, NaiveDate::from_ymd_opt(2027, 4, 1));
        assert_eq!(answer.confidence_level, 90);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_version_takes_newest_cycle() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ubuntu.json")
            .with_status(200)
            .with_body(UBUNTU_CYCLES)
            .create_async()
            .await;

        let source = source_against(&server);
        let answer = source.query("ubuntu", None).await.unwrap().unwrap();
        assert_eq!(answer.cycle, "24.04");
    }

    #[tokio::test]
    async fn test_unmatched_version_lowers_confidence() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ubuntu.json")
            .with_status(200)
            .with_body(UBUNTU_CYCLES)
            .create_async()
            .await;

        let source = source_against(&server);
        let answer = source.query("ubuntu", Some("13.37")).await.unwrap().unwrap();
        assert_eq!(answer.confidence_level, 80);
        assert_eq!(answer.cycle, "24.04");
    }

    #[tokio::test]
    async fn test_unknown_product_is_clean_no_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ghostware.json")
            .with_status(404)
            .create_async()
            .await;

        let source = EndOfLifeHttpSource::new(
            EndOfLifeSourceConfig::fallback("endoflife").with_base_url(&server.url()),
        )
        .unwrap();
        assert!(source.query("ghostware", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_source_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ubuntu.json")
            .with_status(500)
            .create_async()
            .await;

        let source = source_against(&server);
        assert!(matches!(
            source.query("ubuntu", None).await,
            Err(SourceError::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ubuntu.json")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let source = source_against(&server);
        assert!(matches!(
            source.query("ubuntu", None).await,
            Err(SourceError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_fallback_guesses_slug_from_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/apache-http-server.json")
            .with_status(200)
            .with_body(r#"[{"cycle": "2.4", "eol": false, "latest": "2.4.62"}]"#)
            .create_async()
            .await;

        let source = EndOfLifeHttpSource::new(
            EndOfLifeSourceConfig::fallback("endoflife").with_base_url(&server.url()),
        )
        .unwrap();
        let answer = source.query("apache http server", None).await.unwrap().unwrap();
        assert_eq!(answer.confidence_level, 70);
        assert_eq!(answer.eol_date, None);
        mock.assert_async().await;
    }

    #[test]
    fn test_numeric_cycle_values() {
        let row: CycleRow = serde_json::from_str(r#"{"cycle": 14, "eol": "2026-11-12"}"#).unwrap();
        assert_eq!(row.cycle_string(), "14");
        assert!(row.matches("14"));
        assert!(row.matches("14.2"));
        assert!(!row.matches("141"));
    }
}
