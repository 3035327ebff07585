//! CPU statistics parsing for process metrics.
//!
//! This module provides functions to parse `/proc/<pid>/stat` and to derive
//! the lifetime-average CPU percentage of a process.

use nix::time::{clock_gettime, ClockId};
use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;
use tracing::debug;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Kernel thread flag from `include/linux/sched.h`.
pub const PF_KTHREAD: u64 = 0x0020_0000;

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as u64;
            }
        }
    }
    // Fallback to common default for error cases or non-Unix platforms
    100
}

/// System clock ticks per second (for CPU time calculation).
pub static CLK_TCK: Lazy<u64> = Lazy::new(get_clk_tck);

/// The fields of /proc/<pid>/stat the snapshot needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFields {
    pub state: char,
    pub flags: u64,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    pub starttime_ticks: u64,
}

impl StatFields {
    pub fn is_kernel_thread(&self) -> bool {
        self.flags & PF_KTHREAD != 0
    }

    pub fn cpu_time_ns(&self) -> u64 {
        ticks_to_ns(self.utime_ticks.saturating_add(self.stime_ticks))
    }

    pub fn start_time_ns(&self) -> u64 {
        ticks_to_ns(self.starttime_ticks)
    }
}

/// Converts clock ticks to nanoseconds.
pub fn ticks_to_ns(ticks: u64) -> u64 {
    let ns = ticks as u128 * NANOS_PER_SEC as u128 / *CLK_TCK as u128;
    u64::try_from(ns).unwrap_or(u64::MAX)
}

/// Parses the content of /proc/<pid>/stat.
///
/// The comm field may contain spaces and parentheses, so fields are counted
/// from the last `)`.
pub fn parse_stat_content(content: &str) -> Result<StatFields, String> {
    let close = content
        .rfind(')')
        .ok_or_else(|| "Invalid stat format: missing ')'".to_string())?;
    let parts: Vec<&str> = content[close + 1..].split_whitespace().collect();

    // parts[0] is field 3 (state), parts[19] is field 22 (starttime)
    if parts.len() <= 19 {
        return Err(format!(
            "Invalid stat format: expected at least 22 fields, got {}",
            parts.len() + 2
        ));
    }

    let field = |idx: usize, name: &str| -> Result<u64, String> {
        parts[idx]
            .parse::<u64>()
            .map_err(|e| format!("Failed to parse {} field: {}", name, e))
    };

    Ok(StatFields {
        state: parts[0].chars().next().unwrap_or('?'),
        flags: field(6, "flags")?,
        utime_ticks: field(11, "utime")?,
        stime_ticks: field(12, "stime")?,
        starttime_ticks: field(19, "starttime")?,
    })
}

/// Reads and parses /proc/<pid>/stat.
pub fn read_stat(proc_path: &Path) -> Result<StatFields, std::io::Error> {
    let content = fs::read_to_string(proc_path.join("stat"))?;
    parse_stat_content(&content).map_err(std::io::Error::other)
}

/// Current boot-based monotonic time in nanoseconds.
///
/// Same clock as the `starttime` field of /proc/<pid>/stat. Returns 0 when the
/// clock cannot be read, which makes every CPU percentage degrade to 0.
pub fn boottime_now_ns() -> u64 {
    match clock_gettime(ClockId::CLOCK_BOOTTIME) {
        Ok(ts) => {
            let secs = u64::try_from(ts.tv_sec()).unwrap_or(0);
            let nanos = u64::try_from(ts.tv_nsec()).unwrap_or(0);
            secs.saturating_mul(NANOS_PER_SEC).saturating_add(nanos)
        }
        Err(e) => {
            debug!("Failed to read CLOCK_BOOTTIME: {}", e);
            0
        }
    }
}

/// Lifetime-average CPU usage in percent, truncated.
///
/// Returns 0 for an unknown start time (0) or a non-positive elapsed time.
/// Not clamped: a multi-threaded process can exceed 100.
pub fn cpu_percent(cpu_time_ns: u64, start_time_ns: u64, now_ns: u64) -> u64 {
    if start_time_ns == 0 || now_ns <= start_time_ns {
        return 0;
    }
    let elapsed = (now_ns - start_time_ns) as u128;
    let pct = cpu_time_ns as u128 * 100 / elapsed;
    u64::try_from(pct).unwrap_or(u64::MAX)
}
