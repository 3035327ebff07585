//! In-memory and JSON-file-backed process table sources.
//!
//! `TestDataSource` re-reads its file for every snapshot so edits show up on
//! the next report, the same way a live process table would. Within one
//! snapshot the file is read once.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::process::{HostMemory, ProcessRecord};
use crate::source::{ProcessIter, ProcessSource, Snapshot, SourceError};

fn default_page_size() -> u64 {
    4096
}

/// Root structure of a test data JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestData {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Clock value used as "now" for CPU percentages.
    #[serde(default)]
    pub now_ns: u64,
    #[serde(default)]
    pub host_memory: HostMemory,
    #[serde(default)]
    pub processes: Vec<ProcessRecord>,
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            generated_at: String::new(),
            page_size: default_page_size(),
            now_ns: 0,
            host_memory: HostMemory::default(),
            processes: Vec::new(),
        }
    }
}

/// Loads test data from a JSON file.
pub fn load_test_data_from_file(path: &Path) -> Result<TestData, SourceError> {
    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SourceError::TestData {
        path: path.to_path_buf(),
        source,
    })
}

/// Fixed process table held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: TestData,
}

impl MemorySource {
    pub fn new(data: TestData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &TestData {
        &self.data
    }
}

impl ProcessSource for MemorySource {
    fn snapshot(&self) -> Result<Snapshot<'_>, SourceError> {
        Ok(Snapshot::Live(self))
    }

    fn processes(&self) -> Result<ProcessIter<'_>, SourceError> {
        Ok(Box::new(self.data.processes.iter().cloned()))
    }

    fn host_memory(&self) -> Result<HostMemory, SourceError> {
        Ok(self.data.host_memory)
    }

    fn now_ns(&self) -> u64 {
        self.data.now_ns
    }

    fn page_size(&self) -> u64 {
        self.data.page_size
    }

    fn describe(&self) -> String {
        format!("memory:{} processes", self.data.processes.len())
    }
}

/// Reads the process table from a test data JSON file on every call.
#[derive(Debug)]
pub struct TestDataSource {
    path: PathBuf,
    loads: AtomicU64,
}

impl TestDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loads: AtomicU64::new(0),
        }
    }

    /// Number of times the file has been read and parsed.
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    fn load(&self) -> Result<TestData, SourceError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        load_test_data_from_file(&self.path)
    }
}

impl ProcessSource for TestDataSource {
    fn snapshot(&self) -> Result<Snapshot<'_>, SourceError> {
        Ok(Snapshot::Loaded(MemorySource::new(self.load()?)))
    }

    fn processes(&self) -> Result<ProcessIter<'_>, SourceError> {
        let data = self.load()?;
        Ok(Box::new(data.processes.into_iter()))
    }

    fn host_memory(&self) -> Result<HostMemory, SourceError> {
        Ok(self.load()?.host_memory)
    }

    // Clock and page size fall back to the defaults if the file turns unreadable;
    // the following processes()/host_memory() call reports the error.
    fn now_ns(&self) -> u64 {
        self.load().map(|d| d.now_ns).unwrap_or(0)
    }

    fn page_size(&self) -> u64 {
        self.load()
            .map(|d| d.page_size)
            .unwrap_or_else(|_| default_page_size())
    }

    fn describe(&self) -> String {
        format!("testdata:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::NamespaceSet;
    use tempfile::tempdir;

    fn sample() -> TestData {
        TestData {
            now_ns: 10_000,
            host_memory: HostMemory {
                total_pages: 1024,
                free_pages: 512,
            },
            processes: vec![ProcessRecord {
                pid: 1,
                name: "init".to_string(),
                state: 1,
                start_time_ns: 1_000,
                cpu_time_ns: 0,
                resident_pages: None,
                total_virtual_pages: None,
                namespaces: NamespaceSet::default(),
            }],
            ..TestData::default()
        }
    }

    #[test]
    fn test_memory_source_is_repeatable() {
        let source = MemorySource::new(sample());
        assert_eq!(source.processes().unwrap().count(), 1);
        assert_eq!(source.processes().unwrap().count(), 1);
        assert_eq!(source.host_memory().unwrap().total_pages, 1024);
        assert_eq!(source.now_ns(), 10_000);
        assert_eq!(source.page_size(), 4096);
    }

    #[test]
    fn test_file_source_reads_fresh_data() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("testdata.json");
        fs::write(&path, serde_json::to_string(&sample()).unwrap()).unwrap();

        let source = TestDataSource::new(&path);
        assert_eq!(source.processes().unwrap().count(), 1);

        let mut changed = sample();
        changed.processes.clear();
        fs::write(&path, serde_json::to_string(&changed).unwrap()).unwrap();
        assert_eq!(source.processes().unwrap().count(), 0);
    }

    #[test]
    fn test_file_source_errors() {
        let dir = tempdir().expect("Failed to create temp dir");
        let missing = TestDataSource::new(dir.path().join("missing.json"));
        assert!(matches!(missing.processes(), Err(SourceError::Io { .. })));

        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let broken = TestDataSource::new(&path);
        assert!(matches!(broken.host_memory(), Err(SourceError::TestData { .. })));
        assert_eq!(broken.page_size(), 4096);
    }

    #[test]
    fn test_file_snapshot_reads_once() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("testdata.json");
        fs::write(&path, serde_json::to_string(&sample()).unwrap()).unwrap();

        let source = TestDataSource::new(&path);
        let snapshot = source.snapshot().unwrap();
        assert_eq!(source.loads(), 1);

        // Rewriting the file does not change a snapshot already taken.
        fs::write(&path, serde_json::to_string(&TestData::default()).unwrap()).unwrap();
        let view = snapshot.source();
        assert_eq!(view.processes().unwrap().count(), 1);
        assert_eq!(view.now_ns(), 10_000);
        assert_eq!(view.host_memory().unwrap().total_pages, 1024);
        assert_eq!(source.loads(), 1);

        assert_eq!(source.snapshot().unwrap().source().processes().unwrap().count(), 0);
        assert_eq!(source.loads(), 2);
    }

    #[test]
    fn test_missing_file_snapshot_fails() {
        let dir = tempdir().expect("Failed to create temp dir");
        let source = TestDataSource::new(dir.path().join("missing.json"));
        assert!(matches!(source.snapshot(), Err(SourceError::Io { .. })));
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let data: TestData = serde_json::from_str(r#"{"processes": []}"#).unwrap();
        assert_eq!(data.page_size, 4096);
        assert_eq!(data.host_memory, HostMemory::default());
    }
}
