//! Process-related modules for records, metrics and classification.
//!
//! This module provides:
//! - `ProcessRecord` / `HostMemory`: raw per-snapshot data handed out by a source
//! - `memory`: page conversions and /proc/<pid>/statm, /proc/meminfo parsing
//! - `cpu`: CPU time parsing and lifetime-average CPU percent
//! - `metrics`: the derived per-process metrics used by the reports
//! - `scanner`: process discovery and per-pid reads from /proc
//! - `classifier`: host vs. containerized classification

pub mod classifier;
pub mod cpu;
pub mod memory;
pub mod metrics;
pub mod scanner;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use classifier::{ContainerClassifier, NamespaceClassifier};
pub use metrics::{compute_metrics, ProcessMetrics};

/// Namespace types exposed under /proc/<pid>/ns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    Uts,
    Pid,
    Mnt,
    Net,
    Ipc,
    Cgroup,
    User,
}

impl NamespaceKind {
    pub const ALL: [NamespaceKind; 7] = [
        NamespaceKind::Uts,
        NamespaceKind::Pid,
        NamespaceKind::Mnt,
        NamespaceKind::Net,
        NamespaceKind::Ipc,
        NamespaceKind::Cgroup,
        NamespaceKind::User,
    ];

    /// Name of the link under /proc/<pid>/ns.
    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceKind::Uts => "uts",
            NamespaceKind::Pid => "pid",
            NamespaceKind::Mnt => "mnt",
            NamespaceKind::Net => "net",
            NamespaceKind::Ipc => "ipc",
            NamespaceKind::Cgroup => "cgroup",
            NamespaceKind::User => "user",
        }
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamespaceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        NamespaceKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Invalid namespace kind '{}', expected one of uts, pid, mnt, net, ipc, cgroup, user",
                    s
                )
            })
    }
}

/// Namespace identifiers (inode numbers) of a process, one per kind.
///
/// A `None` entry means the identifier could not be read (permissions,
/// process gone, kernel without that namespace type).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnt: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipc: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cgroup: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<u64>,
}

impl NamespaceSet {
    pub fn get(&self, kind: NamespaceKind) -> Option<u64> {
        match kind {
            NamespaceKind::Uts => self.uts,
            NamespaceKind::Pid => self.pid,
            NamespaceKind::Mnt => self.mnt,
            NamespaceKind::Net => self.net,
            NamespaceKind::Ipc => self.ipc,
            NamespaceKind::Cgroup => self.cgroup,
            NamespaceKind::User => self.user,
        }
    }

    pub fn set(&mut self, kind: NamespaceKind, id: Option<u64>) {
        let slot = match kind {
            NamespaceKind::Uts => &mut self.uts,
            NamespaceKind::Pid => &mut self.pid,
            NamespaceKind::Mnt => &mut self.mnt,
            NamespaceKind::Net => &mut self.net,
            NamespaceKind::Ipc => &mut self.ipc,
            NamespaceKind::Cgroup => &mut self.cgroup,
            NamespaceKind::User => &mut self.user,
        };
        *slot = id;
    }

    /// Builder-style variant of [`NamespaceSet::set`].
    pub fn with(mut self, kind: NamespaceKind, id: u64) -> Self {
        self.set(kind, Some(id));
        self
    }
}

/// One process as seen by a source at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    /// Scheduler state code, reported verbatim.
    #[serde(default)]
    pub state: i64,
    /// Boot-based monotonic start time in nanoseconds; 0 = unknown.
    #[serde(default)]
    pub start_time_ns: u64,
    /// User + kernel CPU time in nanoseconds.
    #[serde(default)]
    pub cpu_time_ns: u64,
    /// `None` when the process has no memory map (kernel threads).
    #[serde(default)]
    pub resident_pages: Option<u64>,
    #[serde(default)]
    pub total_virtual_pages: Option<u64>,
    #[serde(default)]
    pub namespaces: NamespaceSet,
}

impl ProcessRecord {
    pub fn namespace_id(&self, kind: NamespaceKind) -> Option<u64> {
        self.namespaces.get(kind)
    }

    pub fn has_memory_map(&self) -> bool {
        self.resident_pages.is_some() && self.total_virtual_pages.is_some()
    }
}

/// Host-wide memory counters in pages, sampled once per report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMemory {
    pub total_pages: u64,
    pub free_pages: u64,
}

/// Maps a /proc/<pid>/stat state letter to the kernel task state value.
pub fn state_code(state: char) -> i64 {
    match state {
        'R' => 0x0000,
        'S' => 0x0001,
        'D' => 0x0002,
        'T' => 0x0004,
        't' => 0x0008,
        'X' => 0x0010,
        'Z' => 0x0020,
        'P' => 0x0040,
        // TASK_IDLE = TASK_UNINTERRUPTIBLE | TASK_NOLOAD
        'I' => 0x0402,
        _ => 0x0000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_kind_parse() {
        assert_eq!("uts".parse::<NamespaceKind>(), Ok(NamespaceKind::Uts));
        assert_eq!(" PID ".parse::<NamespaceKind>(), Ok(NamespaceKind::Pid));
        assert!("docker".parse::<NamespaceKind>().is_err());
    }

    #[test]
    fn test_namespace_set_get_and_set() {
        let mut ns = NamespaceSet::default().with(NamespaceKind::Uts, 4026531838);
        assert_eq!(ns.get(NamespaceKind::Uts), Some(4026531838));
        assert_eq!(ns.get(NamespaceKind::Net), None);

        ns.set(NamespaceKind::Uts, None);
        assert_eq!(ns.get(NamespaceKind::Uts), None);
    }

    #[test]
    fn test_state_codes() {
        assert_eq!(state_code('R'), 0);
        assert_eq!(state_code('S'), 1);
        assert_eq!(state_code('D'), 2);
        assert_eq!(state_code('Z'), 32);
        assert_eq!(state_code('I'), 1026);
        assert_eq!(state_code('?'), 0);
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let rec: ProcessRecord =
            serde_json::from_str(r#"{"pid": 7, "name": "kworker/0:1"}"#).unwrap();
        assert_eq!(rec.pid, 7);
        assert_eq!(rec.start_time_ns, 0);
        assert!(!rec.has_memory_map());
        assert_eq!(rec.namespace_id(NamespaceKind::Uts), None);
    }
}
