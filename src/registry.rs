//! Named report endpoints.
//!
//! The registry binds a readable name to a [`ReportGenerator`] and runs the
//! generator on every read. It keeps no report state of its own: each
//! `generate` call produces a brand new snapshot.

use ahash::AHashMap as HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

use crate::process::ContainerClassifier;
use crate::report::{build_container_report, build_system_report, Report, ReportKind};
use crate::source::{ProcessSource, SourceError};

/// Produces one report per call.
pub trait ReportGenerator: Send + Sync {
    fn kind(&self) -> ReportKind;
    fn generate(&self) -> Result<Report, SourceError>;
}

/// Generator of the system report.
pub struct SystemReportGenerator {
    source: Arc<dyn ProcessSource>,
}

impl SystemReportGenerator {
    pub fn new(source: Arc<dyn ProcessSource>) -> Self {
        Self { source }
    }
}

impl ReportGenerator for SystemReportGenerator {
    fn kind(&self) -> ReportKind {
        ReportKind::System
    }

    fn generate(&self) -> Result<Report, SourceError> {
        build_system_report(self.source.as_ref()).map(Report::System)
    }
}

/// Generator of the container report.
pub struct ContainerReportGenerator {
    source: Arc<dyn ProcessSource>,
    classifier: Arc<dyn ContainerClassifier>,
}

impl ContainerReportGenerator {
    pub fn new(source: Arc<dyn ProcessSource>, classifier: Arc<dyn ContainerClassifier>) -> Self {
        Self { source, classifier }
    }
}

impl ReportGenerator for ContainerReportGenerator {
    fn kind(&self) -> ReportKind {
        ReportKind::Container
    }

    fn generate(&self) -> Result<Report, SourceError> {
        build_container_report(self.source.as_ref(), self.classifier.as_ref())
            .map(Report::Container)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Endpoint '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("Invalid endpoint name '{0}': must be non-empty and must not contain '/'")]
    InvalidName(String),

    #[error("Endpoint '{0}' is not registered")]
    NotFound(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Checks that `name` can be used as a single path segment.
pub fn validate_endpoint_name(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() || name.contains('/') || name.trim() != name {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Map of endpoint name to generator.
#[derive(Default)]
pub struct EndpointRegistry {
    endpoints: RwLock<HashMap<String, Arc<dyn ReportGenerator>>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: &str,
        generator: Arc<dyn ReportGenerator>,
    ) -> Result<(), RegistryError> {
        validate_endpoint_name(name)?;
        let mut endpoints = self.endpoints.write().unwrap_or_else(|e| e.into_inner());
        if endpoints.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        info!("Registered {} report endpoint '{}'", generator.kind(), name);
        endpoints.insert(name.to_string(), generator);
        Ok(())
    }

    /// Removes `name`; returns whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        let mut endpoints = self.endpoints.write().unwrap_or_else(|e| e.into_inner());
        let removed = endpoints.remove(name).is_some();
        if removed {
            info!("Unregistered report endpoint '{}'", name);
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ReportGenerator>> {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());
        endpoints.get(name).cloned()
    }

    /// Runs the generator registered under `name`.
    ///
    /// The lock is released before the snapshot is computed.
    pub fn generate(&self, name: &str) -> Result<Report, RegistryError> {
        let generator = self
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        debug!("Generating {} report for '{}'", generator.kind(), name);
        Ok(generator.generate()?)
    }

    /// Registered names with their report kinds, sorted by name.
    pub fn endpoints(&self) -> Vec<(String, ReportKind)> {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<(String, ReportKind)> = endpoints
            .iter()
            .map(|(name, g)| (name.clone(), g.kind()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}
