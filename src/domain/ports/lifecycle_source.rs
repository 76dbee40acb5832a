//! Lifecycle source port - the knowledge-source adapter contract.

use async_trait::async_trait;

use crate::domain::errors::SourceResult;
use crate::domain::models::AgentResponse;

/// A knowledge source queried for lifecycle facts about one product.
///
/// Implementations cover one vendor or data set each; the dispatcher fans a
/// query out to the selected subset and ranks whatever comes back.
#[async_trait]
pub trait LifecycleSource: Send + Sync {
    /// Stable identity recorded as `agent_name` on every response.
    fn name(&self) -> &str;

    /// Query lifecycle facts for a normalized product name.
    ///
    /// `Ok(None)` means the source cleanly has no data for the product.
    /// Errors are recovered by the dispatcher as "no answer". The overall
    /// wait budget is enforced by the dispatcher, not the adapter.
    async fn query(
        &self,
        normalized_name: &str,
        normalized_version: Option<&str>,
    ) -> SourceResult<Option<AgentResponse>>;
}
