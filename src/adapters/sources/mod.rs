//! Lifecycle source adapters.

pub mod endoflife_http;
pub mod mock;
pub mod registry;

pub use endoflife_http::{EndOfLifeHttpSource, EndOfLifeSourceConfig, DEFAULT_BASE_URL};
pub use mock::MockSource;
pub use registry::{default_selector, default_sources};
