//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers, and wires the configured source into the endpoint
//! registry.

use procinfo_exporter::{
    ContainerReportGenerator, EndpointRegistry, NamespaceClassifier, ProcessSource,
    ProcfsSource, RegistryError, SystemReportGenerator, TestDataSource,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::config::Config;
use crate::health_stats::HealthStats;
use crate::telemetry::Telemetry;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    /// Named report endpoints.
    pub endpoints: Arc<EndpointRegistry>,
    /// Human-readable description of the process table source.
    pub source_description: String,
    pub telemetry: Telemetry,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Fresh state around an already populated registry.
    pub fn new(
        config: Config,
        endpoints: Arc<EndpointRegistry>,
        source_description: String,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            endpoints,
            source_description,
            telemetry: Telemetry::new()?,
            config: Arc::new(config),
            health_stats: Arc::new(HealthStats::new()),
            start_time: Instant::now(),
        })
    }
}

/// Picks the process table source: test data file if configured, procfs otherwise.
pub fn build_source(config: &Config) -> Arc<dyn ProcessSource> {
    match &config.test_data_file {
        Some(path) => {
            info!("Using test data file: {}", path.display());
            Arc::new(TestDataSource::new(path.clone()))
        }
        None => {
            let root = config.proc_root();
            info!("Reading processes from {}", root.display());
            Arc::new(ProcfsSource::new(root, config.namespace_kinds()))
        }
    }
}

/// Registers the system and container reports under their configured names.
pub fn build_registry(
    config: &Config,
    source: Arc<dyn ProcessSource>,
) -> Result<EndpointRegistry, RegistryError> {
    let registry = EndpointRegistry::new();
    let classifier = Arc::new(NamespaceClassifier::new(config.namespace_kinds()));

    registry.register(
        config.system_endpoint(),
        Arc::new(SystemReportGenerator::new(source.clone())),
    )?;
    registry.register(
        config.container_endpoint(),
        Arc::new(ContainerReportGenerator::new(source, classifier)),
    )?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use procinfo_exporter::{MemorySource, ReportKind, TestData};

    #[test]
    fn test_build_registry_uses_configured_names() {
        let mut config = Config::default();
        config.container_endpoint = Some("containers".into());
        let source: Arc<dyn ProcessSource> = Arc::new(MemorySource::new(TestData::default()));

        let registry = build_registry(&config, source).unwrap();
        assert_eq!(
            registry.endpoints(),
            vec![
                ("containers".to_string(), ReportKind::Container),
                ("sysinfo".to_string(), ReportKind::System),
            ]
        );
    }

    #[test]
    fn test_build_registry_rejects_clashing_names() {
        let mut config = Config::default();
        config.container_endpoint = config.system_endpoint.clone();
        let source: Arc<dyn ProcessSource> = Arc::new(MemorySource::new(TestData::default()));

        assert!(matches!(
            build_registry(&config, source),
            Err(RegistryError::AlreadyRegistered(_))
        ));
    }
}
