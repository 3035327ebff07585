//! Process scanning utilities for reading process entries from /proc.
//!
//! This module walks a procfs root for numeric PID directories and turns
//! each one into a [`ProcessRecord`]. Optional files that cannot be read
//! degrade to absent fields; only the directory walk itself can fail.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::process::cpu::read_stat;
use crate::process::memory::read_statm;
use crate::process::{state_code, NamespaceKind, NamespaceSet, ProcessRecord};

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Lazily scans `root` for process entries with numeric PIDs, in directory order.
///
/// Fails only when `root` itself cannot be listed.
pub fn scan_proc_entries(root: &Path) -> Result<impl Iterator<Item = ProcEntry>, std::io::Error> {
    let entries = fs::read_dir(root)?;
    Ok(entries.flatten().filter_map(|entry| {
        let p = entry.path();
        let name = p.file_name().and_then(|s| s.to_str())?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let pid: u32 = name.parse().ok()?;
        Some(ProcEntry { pid, proc_path: p })
    }))
}

/// Collects up to `max` entries (used by the `check` command).
pub fn collect_proc_entries(root: &Path, max: Option<usize>) -> Vec<ProcEntry> {
    match scan_proc_entries(root) {
        Ok(iter) => match max {
            Some(maxp) => iter.take(maxp).collect(),
            None => iter.collect(),
        },
        Err(_) => Vec::new(),
    }
}

/// Reads process name from comm file or extracts from cmdline.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    if let Ok(s) = fs::read_to_string(proc_path.join("comm")) {
        let t = s.trim_end_matches('\n');
        if !t.is_empty() {
            return Some(t.into());
        }
    }

    if let Ok(content) = fs::read(proc_path.join("cmdline")) {
        let first = content.split(|&b| b == 0u8).next().unwrap_or_default();
        if let Ok(s) = std::str::from_utf8(first) {
            if let Some(name) = Path::new(s).file_name() {
                return name.to_str().map(|s| s.to_string());
            }
        }
    }
    None
}

/// Parses a namespace link target such as `uts:[4026531838]` into its inode.
pub fn parse_namespace_link(target: &str) -> Option<u64> {
    let start = target.find('[')?;
    let end = target.rfind(']')?;
    if end <= start {
        return None;
    }
    target[start + 1..end].parse().ok()
}

/// Reads the namespace inode of `kind` from /proc/<pid>/ns/<kind>.
pub fn read_namespace_id(proc_path: &Path, kind: NamespaceKind) -> Option<u64> {
    let link = proc_path.join("ns").join(kind.as_str());
    match fs::read_link(&link) {
        Ok(target) => target.to_str().and_then(parse_namespace_link),
        Err(e) => {
            trace!("Cannot read {}: {}", link.display(), e);
            None
        }
    }
}

/// Reads the requested namespace identifiers of a process.
pub fn read_namespaces(proc_path: &Path, kinds: &[NamespaceKind]) -> NamespaceSet {
    let mut set = NamespaceSet::default();
    for &kind in kinds {
        set.set(kind, read_namespace_id(proc_path, kind));
    }
    set
}

/// Builds a [`ProcessRecord`] for one /proc entry.
///
/// Returns `None` when the process vanished between the directory walk and
/// the read of its stat file.
pub fn read_process_record(entry: &ProcEntry, kinds: &[NamespaceKind]) -> Option<ProcessRecord> {
    let stat = match read_stat(&entry.proc_path) {
        Ok(s) => s,
        Err(e) => {
            trace!("Skipping pid {}: {}", entry.pid, e);
            return None;
        }
    };

    // Kernel threads have no mm; statm then reports zeros, treat it as absent
    let statm = if stat.is_kernel_thread() {
        None
    } else {
        read_statm(&entry.proc_path).ok()
    };

    Some(ProcessRecord {
        pid: entry.pid,
        name: read_process_name(&entry.proc_path).unwrap_or_default(),
        state: state_code(stat.state),
        start_time_ns: stat.start_time_ns(),
        cpu_time_ns: stat.cpu_time_ns(),
        resident_pages: statm.map(|s| s.resident_pages),
        total_virtual_pages: statm.map(|s| s.total_virtual_pages),
        namespaces: read_namespaces(&entry.proc_path, kinds),
    })
}
