//! Built-in source registry.
//!
//! The source ids here must line up with the selector's rule table; the
//! dispatcher looks sources up by the ids the selector emits.

use std::sync::Arc;

use anyhow::Result;

use crate::domain::ports::LifecycleSource;
use crate::services::selector::{AgentSelector, FALLBACK_SOURCE_ID};

use super::endoflife_http::{EndOfLifeHttpSource, EndOfLifeSourceConfig};

/// The default source set: vendor-specialized adapters plus the generic
/// fallback, keyed by source id.
pub fn default_sources() -> Result<Vec<(String, Arc<dyn LifecycleSource>)>> {
    let specs = [
        EndOfLifeSourceConfig::specialized("canonical", &[("ubuntu", "ubuntu")]),
        EndOfLifeSourceConfig::specialized(
            "microsoft",
            &[
                ("windows server", "windows-server"),
                ("windows", "windows"),
                ("sql server", "mssqlserver"),
                ("exchange", "exchange"),
                ("sharepoint", "sharepoint"),
                ("office", "office"),
            ],
        ),
        EndOfLifeSourceConfig::specialized(
            "redhat",
            &[
                ("rhel", "rhel"),
                ("red hat", "rhel"),
                ("centos", "centos"),
                ("almalinux", "almalinux"),
                ("rocky", "rocky-linux"),
            ],
        ),
        EndOfLifeSourceConfig::specialized("debian", &[("debian", "debian")]),
        EndOfLifeSourceConfig::specialized(
            "runtimes",
            &[
                ("python", "python"),
                ("node", "nodejs"),
                ("java", "java"),
                ("php", "php"),
                ("ruby", "ruby"),
                (".net", "dotnet"),
                ("dotnet", "dotnet"),
                ("postgres", "postgresql"),
                ("mysql", "mysql"),
            ],
        ),
        EndOfLifeSourceConfig::fallback(FALLBACK_SOURCE_ID),
    ];

    specs
        .into_iter()
        .map(|config| {
            let id = config.name.clone();
            let source = EndOfLifeHttpSource::new(config)?;
            Ok((id, Arc::new(source) as Arc<dyn LifecycleSource>))
        })
        .collect()
}

/// Selector matching the default source set.
pub fn default_selector() -> AgentSelector {
    AgentSelector::with_default_rules()
}
