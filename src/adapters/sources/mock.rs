//! Mock lifecycle source for tests and wiring checks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::domain::errors::{SourceError, SourceResult};
use crate::domain::models::AgentResponse;
use crate::domain::ports::LifecycleSource;

#[derive(Debug, Clone, Copy)]
enum MockBehavior {
    Answer { confidence: u8 },
    Empty,
    Fail,
}

/// Configurable in-memory source: canned answer, clean no-data, or failure,
/// with an optional delay and an invocation counter for concurrency tests.
pub struct MockSource {
    name: String,
    behavior: MockBehavior,
    delay: Option<Duration>,
    eol_date: Option<NaiveDate>,
    invocations: AtomicUsize,
}

impl MockSource {
    /// A source that always answers with the given confidence.
    pub fn answering(name: &str, confidence: u8) -> Self {
        Self {
            name: name.to_string(),
            behavior: MockBehavior::Answer { confidence },
            delay: None,
            eol_date: NaiveDate::from_ymd_opt(2027, 4, 1),
            invocations: AtomicUsize::new(0),
        }
    }

    /// A source that cleanly has no data.
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            behavior: MockBehavior::Empty,
            delay: None,
            eol_date: None,
            invocations: AtomicUsize::new(0),
        }
    }

    /// A source that errors on every query.
    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            behavior: MockBehavior::Fail,
            delay: None,
            eol_date: None,
            invocations: AtomicUsize::new(0),
        }
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Override the reported end-of-life date.
    pub fn with_eol_date(mut self, eol_date: Option<NaiveDate>) -> Self {
        self.eol_date = eol_date;
        self
    }

    /// How many times `query` has been called.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LifecycleSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(
        &self,
        _normalized_name: &str,
        normalized_version: Option<&str>,
    ) -> SourceResult<Option<AgentResponse>> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.behavior {
            MockBehavior::Answer { confidence } => Ok(Some(AgentResponse {
                agent_name: self.name.clone(),
                cycle: normalized_version.unwrap_or("1.0").to_string(),
                eol_date: self.eol_date,
                latest_version: normalized_version.unwrap_or("1.0").to_string(),
                is_lts: false,
                confidence_level: confidence,
                fetched_at: Utc::now(),
            })),
            MockBehavior::Empty => Ok(None),
            MockBehavior::Fail => Err(SourceError::Request("mock failure".to_string())),
        }
    }
}
