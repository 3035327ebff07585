//! procinfo-exporter library
//!
//! Point-in-time snapshots of the Linux process table, rendered as JSON
//! reports. Every read builds a fresh snapshot; nothing is cached.
//!
//! # Components
//!
//! - **Sources** ([`source`]): the live process table (`ProcfsSource`) or a
//!   fixed/JSON-backed one (`MemorySource`, `TestDataSource`)
//! - **Classifier** ([`process::classifier`]): host vs. containerized, by namespace
//! - **Metrics** ([`process::metrics`]): RSS/VSZ in KB, lifetime CPU %, memory %
//! - **Reports** ([`report`]): system and container reports, canonical JSON
//! - **Registry** ([`registry`]): named endpoints dispatching to report generators
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use procinfo_exporter::{
//!     ContainerReportGenerator, EndpointRegistry, MemorySource, NamespaceClassifier,
//!     ProcessSource, SystemReportGenerator, TestData,
//! };
//!
//! let source: Arc<dyn ProcessSource> = Arc::new(MemorySource::new(TestData::default()));
//! let registry = EndpointRegistry::new();
//! registry
//!     .register("sysinfo", Arc::new(SystemReportGenerator::new(source.clone())))
//!     .unwrap();
//! registry
//!     .register(
//!         "continfo",
//!         Arc::new(ContainerReportGenerator::new(
//!             source,
//!             Arc::new(NamespaceClassifier::default()),
//!         )),
//!     )
//!     .unwrap();
//!
//! let json = registry.generate("continfo").unwrap().render().unwrap();
//! assert_eq!(json, "[]\n");
//! ```

pub mod process;
pub mod registry;
pub mod report;
pub mod source;

// Re-export main types for convenience
pub use process::{
    ContainerClassifier, HostMemory, NamespaceClassifier, NamespaceKind, NamespaceSet,
    ProcessRecord,
};
pub use registry::{
    ContainerReportGenerator, EndpointRegistry, RegistryError, ReportGenerator,
    SystemReportGenerator,
};
pub use report::{
    build_container_report, build_system_report, render, ContainerProcessEntry, ContainerReport,
    Report, ReportKind, SystemProcessEntry, SystemReport,
};
pub use source::{
    MemorySource, ProcessSource, ProcfsSource, Snapshot, SourceError, TestData, TestDataSource,
};
