//! Report building and canonical JSON rendering.
//!
//! Two report shapes exist: the system report (host RAM totals plus every
//! process) and the container report (an array of containerized processes
//! only). Both are built fresh from a [`ProcessSource`] on every call, in the
//! source's iteration order, and serialized once with a fixed field order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter;
use std::str::FromStr;
use tracing::debug;

use crate::process::memory::pages_to_kb;
use crate::process::{compute_metrics, ContainerClassifier, HostMemory, NamespaceSet, ProcessRecord};
use crate::source::{ProcessIter, ProcessSource, SourceError};

/// Pid of init, the host reference for namespace comparison.
const INIT_PID: u32 = 1;

/// One process in the system report. Field order is the output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProcessEntry {
    pub pid: u32,
    pub name: String,
    pub state: i64,
    /// Resident set size in KB.
    pub rss: u64,
    pub mem_percent: u64,
    /// Virtual size in KB.
    pub vsz: u64,
    pub cpu: u64,
}

/// Host RAM totals plus all processes. RAM fields are in MB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemReport {
    pub total_ram: u64,
    pub free_ram: u64,
    pub used_ram: u64,
    pub processes: Vec<SystemProcessEntry>,
}

/// One process in the container report. Field order is the output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerProcessEntry {
    pub pid: u32,
    pub name: String,
    pub rss: u64,
    pub vsz: u64,
    pub cpu: u64,
}

/// Containerized processes only, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerReport {
    pub processes: Vec<ContainerProcessEntry>,
}

/// Which report a generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    System,
    Container,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::System => f.write_str("system"),
            ReportKind::Container => f.write_str("container"),
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(ReportKind::System),
            "container" => Ok(ReportKind::Container),
            other => Err(format!(
                "Invalid report kind '{}', expected 'system' or 'container'",
                other
            )),
        }
    }
}

/// Either report, as handed out by the endpoint registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    System(SystemReport),
    Container(ContainerReport),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::System(_) => ReportKind::System,
            Report::Container(_) => ReportKind::Container,
        }
    }

    pub fn entry_count(&self) -> usize {
        match self {
            Report::System(r) => r.processes.len(),
            Report::Container(r) => r.processes.len(),
        }
    }

    /// Canonical JSON document for this report.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        match self {
            Report::System(r) => render(r),
            Report::Container(r) => render(r),
        }
    }
}

/// Serializes with 2-space indentation, fixed field order and a trailing newline.
pub fn render<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

/// Host RAM in KB. `used_kb` is derived from the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRam {
    pub total_kb: u64,
    pub free_kb: u64,
    pub used_kb: u64,
}

impl HostRam {
    pub fn from_pages(mem: HostMemory, page_size: u64) -> Self {
        let total_kb = pages_to_kb(mem.total_pages, page_size);
        let free_kb = pages_to_kb(mem.free_pages, page_size);
        Self {
            total_kb,
            free_kb,
            used_kb: total_kb.saturating_sub(free_kb),
        }
    }
}

/// Builds the system report: host RAM totals and every process.
///
/// `mem_percent` is relative to total RAM in KB, while the emitted RAM
/// totals are in MB.
pub fn build_system_report(source: &dyn ProcessSource) -> Result<SystemReport, SourceError> {
    let snapshot = source.snapshot()?;
    let view = snapshot.source();
    let page_size = view.page_size();
    let now_ns = view.now_ns();
    let ram = HostRam::from_pages(view.host_memory()?, page_size);

    let mut processes = Vec::new();
    for record in view.processes()? {
        let m = compute_metrics(&record, page_size, now_ns, Some(ram.total_kb));
        processes.push(SystemProcessEntry {
            pid: record.pid,
            name: record.name,
            state: record.state,
            rss: m.rss_kb,
            mem_percent: m.mem_percent.unwrap_or(0),
            vsz: m.vsz_kb,
            cpu: m.cpu_percent,
        });
    }

    debug!(
        "Built system report from {}: {} processes, total_ram={}KB",
        source.describe(),
        processes.len(),
        ram.total_kb
    );

    Ok(SystemReport {
        total_ram: ram.total_kb / 1024,
        free_ram: ram.free_kb / 1024,
        used_ram: ram.used_kb / 1024,
        processes,
    })
}

/// Builds the container report: processes whose namespace differs from the
/// reference record's, as decided by `classifier`.
///
/// The reference is pid 1 when the table has it, otherwise the first record.
pub fn build_container_report(
    source: &dyn ProcessSource,
    classifier: &dyn ContainerClassifier,
) -> Result<ContainerReport, SourceError> {
    let snapshot = source.snapshot()?;
    let view = snapshot.source();
    let page_size = view.page_size();
    let now_ns = view.now_ns();

    let mut records = view.processes()?;
    let Some(first) = records.next() else {
        return Ok(ContainerReport::default());
    };
    let (reference, records): (NamespaceSet, ProcessIter<'_>) = if first.pid == INIT_PID {
        (first.namespaces, Box::new(iter::once(first).chain(records)))
    } else {
        // pid 1 is not first; the whole table is needed to find it.
        let all: Vec<ProcessRecord> = iter::once(first).chain(records).collect();
        let reference = all
            .iter()
            .find(|r| r.pid == INIT_PID)
            .unwrap_or(&all[0])
            .namespaces;
        (reference, Box::new(all.into_iter()))
    };

    let mut processes = Vec::new();
    for record in records {
        if !classifier.is_containerized(&record, &reference) {
            continue;
        }
        let m = compute_metrics(&record, page_size, now_ns, None);
        processes.push(ContainerProcessEntry {
            pid: record.pid,
            name: record.name,
            rss: m.rss_kb,
            vsz: m.vsz_kb,
            cpu: m.cpu_percent,
        });
    }

    debug!(
        "Built container report from {}: {} containerized processes ({:?})",
        source.describe(),
        processes.len(),
        classifier
    );

    Ok(ContainerReport { processes })
}
