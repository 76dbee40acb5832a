//! Agent dispatcher: concurrent fan-out over selected sources.
//!
//! One spawned task per selected source reports into a channel; the
//! collector waits under a shared deadline and abandons (never cancels)
//! workers that outrun it. A timed-out or erroring source is recorded as
//! "no answer" and excluded from ranking, so partial failure never aborts a
//! resolution.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::domain::models::{AgentResponse, DispatcherConfig, Query};
use crate::domain::ports::LifecycleSource;

/// Fans a query out to selected sources and ranks the answers.
pub struct AgentDispatcher {
    sources: HashMap<String, Arc<dyn LifecycleSource>>,
    timeout: Duration,
    history_capacity: usize,
    /// Most-recent-first buffer of every received response, winner or not.
    history: RwLock<VecDeque<AgentResponse>>,
}

impl AgentDispatcher {
    /// Build a dispatcher over a source registry keyed by source id.
    pub fn new(sources: Vec<(String, Arc<dyn LifecycleSource>)>, config: &DispatcherConfig) -> Self {
        Self {
            sources: sources.into_iter().collect(),
            timeout: Duration::from_millis(config.source_timeout_ms),
            history_capacity: config.history_capacity,
            history: RwLock::new(VecDeque::new()),
        }
    }

    /// Resolve a query against the selected sources.
    ///
    /// Returns the winning response: highest confidence, ties broken by
    /// earlier selector position (specialized beats the generic fallback).
    /// `None` means every source returned no answer - a negative result the
    /// caller should cache, not an error.
    pub async fn resolve(&self, query: &Query, selected: &[String]) -> Option<AgentResponse> {
        let (tx, mut rx) = mpsc::channel(selected.len().max(1));
        let mut dispatched = 0usize;

        for (position, source_id) in selected.iter().enumerate() {
            let Some(source) = self.sources.get(source_id) else {
                warn!(source = %source_id, "selected source is not registered");
                continue;
            };
            let source = Arc::clone(source);
            let tx = tx.clone();
            let name = query.normalized_name.clone();
            let version = query.normalized_version.clone();
            dispatched += 1;
            tokio::spawn(async move {
                let outcome = source.query(&name, version.as_deref()).await;
                // The collector may already have given up; a dropped send is fine
                let _ = tx.send((position, source.name().to_string(), outcome)).await;
            });
        }
        drop(tx);

        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut answers: Vec<(usize, AgentResponse)> = Vec::new();

        for _ in 0..dispatched {
            let received = match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(received)) => received,
                Ok(None) => break,
                Err(_) => {
                    // Cancel the wait, not the workers; late results are discarded
                    debug!(
                        outstanding = dispatched - answers.len(),
                        "source wait budget elapsed"
                    );
                    break;
                }
            };
            match received {
                (position, _, Ok(Some(response))) => {
                    self.push_history(response.clone()).await;
                    answers.push((position, response));
                }
                (_, source_name, Ok(None)) => {
                    debug!(source = %source_name, "source has no answer");
                }
                (_, source_name, Err(err)) => {
                    warn!(source = %source_name, error = %err, "source failed, treated as no answer");
                }
            }
        }

        answers.sort_by(|a, b| {
            b.1.confidence_level
                .cmp(&a.1.confidence_level)
                .then(a.0.cmp(&b.0))
        });
        answers.into_iter().next().map(|(_, response)| response)
    }

    /// Snapshot of the response history, most recent first.
    pub async fn history(&self) -> Vec<AgentResponse> {
        self.history.read().await.iter().cloned().collect()
    }

    /// Drop all recorded responses.
    pub async fn clear_history(&self) {
        self.history.write().await.clear();
    }

    async fn push_history(&self, response: AgentResponse) {
        let mut history = self.history.write().await;
        history.push_front(response);
        history.truncate(self.history_capacity);
    }
}
