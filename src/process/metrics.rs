//! Derived per-process metrics.
//!
//! All values use truncating integer arithmetic and every division is guarded,
//! so a degenerate input (no memory map, unknown start time, zero RAM)
//! yields 0 instead of an error.

use crate::process::cpu::cpu_percent;
use crate::process::memory::{mem_percent, pages_to_kb};
use crate::process::ProcessRecord;

/// Metrics reported for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessMetrics {
    pub rss_kb: u64,
    pub vsz_kb: u64,
    pub cpu_percent: u64,
    /// Only computed when the host total is supplied (system report).
    pub mem_percent: Option<u64>,
}

/// Computes RSS/VSZ in KB, CPU percent and, if `total_ram_kb` is given,
/// memory percent of `record`.
pub fn compute_metrics(
    record: &ProcessRecord,
    page_size: u64,
    now_ns: u64,
    total_ram_kb: Option<u64>,
) -> ProcessMetrics {
    let (rss_kb, vsz_kb) = match (record.resident_pages, record.total_virtual_pages) {
        (Some(resident), Some(total)) => {
            (pages_to_kb(resident, page_size), pages_to_kb(total, page_size))
        }
        _ => (0, 0),
    };

    ProcessMetrics {
        rss_kb,
        vsz_kb,
        cpu_percent: cpu_percent(record.cpu_time_ns, record.start_time_ns, now_ns),
        mem_percent: total_ram_kb.map(|total| mem_percent(rss_kb, total)),
    }
}
