//! Process table sources.
//!
//! A source hands out, per call, a lazy sequence of [`ProcessRecord`]s and the
//! host memory totals as they are at call time. Nothing is cached between
//! calls and two calls may observe different tables.
//!
//! A report reads through one [`Snapshot`], so the records, clock, page size
//! and memory totals it uses all come from the same view of the source.

pub mod procfs;
pub mod testdata;

use std::path::PathBuf;
use thiserror::Error;

use crate::process::{HostMemory, ProcessRecord};

pub use procfs::ProcfsSource;
pub use testdata::{MemorySource, TestData, TestDataSource};

/// Lazy, single-pass sequence of process records.
pub type ProcessIter<'a> = Box<dyn Iterator<Item = ProcessRecord> + 'a>;

/// Errors of the process table source. Any of them fails the whole read.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid test data in {path}: {source}")]
    TestData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A view of a source that stays consistent for the length of one report.
pub enum Snapshot<'a> {
    /// Reads straight through to the source.
    Live(&'a dyn ProcessSource),
    /// A table loaded once when the snapshot was taken.
    Loaded(MemorySource),
}

impl Snapshot<'_> {
    pub fn source(&self) -> &dyn ProcessSource {
        match self {
            Snapshot::Live(source) => *source,
            Snapshot::Loaded(table) => table,
        }
    }
}

/// Supplier of the live process table and host memory counters.
pub trait ProcessSource: Send + Sync {
    /// Takes the view a single report is built from.
    fn snapshot(&self) -> Result<Snapshot<'_>, SourceError>;

    /// Starts a fresh enumeration of the process table.
    fn processes(&self) -> Result<ProcessIter<'_>, SourceError>;

    /// Host-wide total/free RAM in pages.
    fn host_memory(&self) -> Result<HostMemory, SourceError>;

    /// Current time on the clock `start_time_ns` is measured against.
    fn now_ns(&self) -> u64;

    /// Size of one page in bytes.
    fn page_size(&self) -> u64;

    /// Short description used in log lines.
    fn describe(&self) -> String;
}
