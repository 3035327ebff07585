//! Memory parsing utilities for process and host memory.
//!
//! This module provides page/KB conversions and parsers for
//! `/proc/<pid>/statm` and `/proc/meminfo`.

use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

use crate::process::HostMemory;

/// Get the system page size in bytes (usually 4096).
fn get_page_size() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_PAGESIZE
        unsafe {
            let size = libc::sysconf(libc::_SC_PAGESIZE);
            if size > 0 {
                return size as u64;
            }
        }
    }
    4096
}

/// System page size in bytes.
pub static PAGE_SIZE: Lazy<u64> = Lazy::new(get_page_size);

/// Converts a page count to kilobytes (truncating).
pub fn pages_to_kb(pages: u64, page_size: u64) -> u64 {
    let kb = pages as u128 * page_size as u128 / 1024;
    u64::try_from(kb).unwrap_or(u64::MAX)
}

/// Converts kilobytes to whole pages (truncating). A zero page size yields 0.
pub fn kb_to_pages(kb: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    let pages = kb as u128 * 1024 / page_size as u128;
    u64::try_from(pages).unwrap_or(u64::MAX)
}

/// Memory usage in percent of total RAM, truncated. 0 when total is 0.
pub fn mem_percent(rss_kb: u64, total_ram_kb: u64) -> u64 {
    if total_ram_kb == 0 {
        return 0;
    }
    let pct = rss_kb as u128 * 100 / total_ram_kb as u128;
    u64::try_from(pct).unwrap_or(u64::MAX)
}

/// Parses kilobyte values from /proc/meminfo style lines.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Page counts from /proc/<pid>/statm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statm {
    pub total_virtual_pages: u64,
    pub resident_pages: u64,
}

/// Parses /proc/<pid>/statm: "size resident shared text lib data dt".
pub fn parse_statm_content(content: &str) -> Result<Statm, String> {
    let mut parts = content.split_whitespace();
    let size = parts
        .next()
        .ok_or_else(|| "Invalid statm format: empty".to_string())?
        .parse::<u64>()
        .map_err(|e| format!("Failed to parse statm size: {}", e))?;
    let resident = parts
        .next()
        .ok_or_else(|| "Invalid statm format: missing resident".to_string())?
        .parse::<u64>()
        .map_err(|e| format!("Failed to parse statm resident: {}", e))?;

    Ok(Statm {
        total_virtual_pages: size,
        resident_pages: resident,
    })
}

/// Reads /proc/<pid>/statm.
pub fn read_statm(proc_path: &Path) -> Result<Statm, std::io::Error> {
    let content = fs::read_to_string(proc_path.join("statm"))?;
    parse_statm_content(&content).map_err(std::io::Error::other)
}

/// Parses MemTotal and MemFree from /proc/meminfo content into pages.
pub fn parse_meminfo_content(content: &str, page_size: u64) -> Result<HostMemory, String> {
    let mut total_kb: Option<u64> = None;
    let mut free_kb: Option<u64> = None;

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("MemTotal:") {
            total_kb = parse_kb_value(v);
        } else if let Some(v) = line.strip_prefix("MemFree:") {
            free_kb = parse_kb_value(v);
        }

        if total_kb.is_some() && free_kb.is_some() {
            break;
        }
    }

    match (total_kb, free_kb) {
        (Some(total), Some(free)) => Ok(HostMemory {
            total_pages: kb_to_pages(total, page_size),
            free_pages: kb_to_pages(free, page_size),
        }),
        _ => Err("Failed to parse MemTotal/MemFree from meminfo".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Tests for page conversions
    // -------------------------------------------------------------------------

    #[test]
    fn test_pages_to_kb() {
        assert_eq!(pages_to_kb(0, 4096), 0);
        assert_eq!(pages_to_kb(1, 4096), 4);
        assert_eq!(pages_to_kb(1024, 4096), 4096);
        assert_eq!(pages_to_kb(3, 65536), 192);
        // Sub-KB page sizes truncate
        assert_eq!(pages_to_kb(1, 512), 0);
    }

    #[test]
    fn test_kb_to_pages() {
        assert_eq!(kb_to_pages(4096, 4096), 1024);
        assert_eq!(kb_to_pages(6, 4096), 1);
        assert_eq!(kb_to_pages(100, 0), 0);
    }

    #[test]
    fn test_mem_percent() {
        assert_eq!(mem_percent(0, 1000), 0);
        assert_eq!(mem_percent(500, 1000), 50);
        assert_eq!(mem_percent(999, 10_000), 9);
        assert_eq!(mem_percent(100, 0), 0);
        // Unclamped
        assert_eq!(mem_percent(3000, 1000), 300);
    }

    // -------------------------------------------------------------------------
    // Tests for parse_kb_value
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_kb_value() {
        assert_eq!(parse_kb_value("       1234 kB"), Some(1234));
        assert_eq!(parse_kb_value("0 kB"), Some(0));
        assert_eq!(parse_kb_value(""), None);
        assert_eq!(parse_kb_value("-1 kB"), None);
        assert_eq!(parse_kb_value("1.5 kB"), None);
    }

    // -------------------------------------------------------------------------
    // Tests for statm / meminfo parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_statm() {
        let statm = parse_statm_content("5765 1321 1002 183 0 552 0\n").expect("valid statm");
        assert_eq!(statm.total_virtual_pages, 5765);
        assert_eq!(statm.resident_pages, 1321);
    }

    #[test]
    fn test_parse_statm_invalid() {
        assert!(parse_statm_content("").is_err());
        assert!(parse_statm_content("12").is_err());
        assert!(parse_statm_content("abc 12").is_err());
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "MemTotal:       16384000 kB\n\
                       MemFree:         8192000 kB\n\
                       MemAvailable:   12000000 kB\n";
        let mem = parse_meminfo_content(content, 4096).expect("valid meminfo");
        assert_eq!(mem.total_pages, 4_096_000);
        assert_eq!(mem.free_pages, 2_048_000);
    }

    #[test]
    fn test_parse_meminfo_missing_fields() {
        assert!(parse_meminfo_content("MemTotal: 100 kB\n", 4096).is_err());
        assert!(parse_meminfo_content("", 4096).is_err());
    }
}
