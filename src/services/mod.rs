//! Service layer: the resolution pipeline and its collaborators.

pub mod cache_manager;
pub mod discovery_scheduler;
pub mod dispatcher;
pub mod metrics_collector;
pub mod normalizer;
pub mod resolution_service;
pub mod selector;

pub use cache_manager::{CacheLookup, CacheManager, Flight, FlightGuard, PutOutcome, VerifyOutcome};
pub use discovery_scheduler::DiscoveryScheduler;
pub use dispatcher::AgentDispatcher;
pub use metrics_collector::MetricsCollector;
pub use normalizer::normalize;
pub use resolution_service::{ClearScope, EngineStatus, Resolution, ResolutionService};
pub use selector::{AgentSelector, SelectorRule, FALLBACK_SOURCE_ID};
