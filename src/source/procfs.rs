//! procfs-backed process table source.

use std::fs;
use std::path::{Path, PathBuf};

use crate::process::cpu::boottime_now_ns;
use crate::process::memory::{parse_meminfo_content, PAGE_SIZE};
use crate::process::scanner::{read_process_record, scan_proc_entries};
use crate::process::{HostMemory, NamespaceKind};
use crate::source::{ProcessIter, ProcessSource, Snapshot, SourceError};

/// Default procfs mount point.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Reads processes from `<root>/<pid>/...` and host memory from `<root>/meminfo`.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
    namespace_kinds: Vec<NamespaceKind>,
}

impl ProcfsSource {
    /// `namespace_kinds` lists the namespaces read for every process.
    pub fn new(root: impl Into<PathBuf>, namespace_kinds: Vec<NamespaceKind>) -> Self {
        Self {
            root: root.into(),
            namespace_kinds,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ProcessSource for ProcfsSource {
    fn snapshot(&self) -> Result<Snapshot<'_>, SourceError> {
        Ok(Snapshot::Live(self))
    }

    fn processes(&self) -> Result<ProcessIter<'_>, SourceError> {
        let entries = scan_proc_entries(&self.root).map_err(|source| SourceError::Io {
            path: self.root.clone(),
            source,
        })?;
        let kinds = &self.namespace_kinds;
        Ok(Box::new(
            entries.filter_map(move |entry| read_process_record(&entry, kinds)),
        ))
    }

    fn host_memory(&self) -> Result<HostMemory, SourceError> {
        let path = self.root.join("meminfo");
        let content = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        parse_meminfo_content(&content, self.page_size())
            .map_err(|reason| SourceError::Parse { path, reason })
    }

    fn now_ns(&self) -> u64 {
        boottime_now_ns()
    }

    fn page_size(&self) -> u64 {
        *PAGE_SIZE
    }

    fn describe(&self) -> String {
        format!("procfs:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        let source = ProcfsSource::new(dir.path().join("missing"), vec![NamespaceKind::Uts]);
        assert!(matches!(source.processes(), Err(SourceError::Io { .. })));
        assert!(matches!(source.host_memory(), Err(SourceError::Io { .. })));
    }

    #[test]
    fn test_empty_root_yields_no_processes() {
        let dir = tempdir().expect("Failed to create temp dir");
        let source = ProcfsSource::new(dir.path(), vec![NamespaceKind::Uts]);
        assert_eq!(source.processes().unwrap().count(), 0);
    }

    #[test]
    fn test_host_memory_from_meminfo() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("meminfo"),
            "MemTotal:        8192 kB\nMemFree:         4096 kB\n",
        )
        .unwrap();
        let source = ProcfsSource::new(dir.path(), vec![NamespaceKind::Uts]);
        let mem = source.host_memory().expect("meminfo should parse");
        let page_kb = *PAGE_SIZE / 1024;
        assert_eq!(mem.total_pages, 8192 / page_kb);
        assert_eq!(mem.free_pages, 4096 / page_kb);
    }

    #[test]
    fn test_garbled_meminfo_is_a_parse_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("meminfo"), "garbage\n").unwrap();
        let source = ProcfsSource::new(dir.path(), vec![NamespaceKind::Uts]);
        assert!(matches!(source.host_memory(), Err(SourceError::Parse { .. })));
    }
}
