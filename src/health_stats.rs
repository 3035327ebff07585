//! Health statistics for the exporter.
//!
//! Tracks report reads, failures and snapshot durations for the plain-text
//! `/health` page.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            *self = RunningStat {
                count: 1,
                sum: value,
                min: value,
                max: value,
                last: value,
            };
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// (last, avg, max, min, count)
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Thread-safe circular buffer for tracking HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(1024)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            // Keep only last 10 minutes of timestamps to avoid unbounded growth
            while guard
                .front()
                .is_some_and(|&t| now.duration_since(t) > Duration::from_secs(600))
            {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            let now = Instant::now();
            guard
                .iter()
                .filter(|&&t| now.duration_since(t) <= Duration::from_secs(60))
                .count() as u64
        } else {
            0
        }
    }
}

/// Health statistics for the exporter.
pub struct HealthStats {
    pub report_reads: AtomicU64,
    pub report_failures: AtomicU64,
    pub snapshot_duration_ms: Stat,
    pub snapshot_entries: Stat,
    pub http_request_timestamps: RequestTimestamps,
    pub start_time: Instant,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            report_reads: AtomicU64::new(0),
            report_failures: AtomicU64::new(0),
            snapshot_duration_ms: Stat::default(),
            snapshot_entries: Stat::default(),
            http_request_timestamps: RequestTimestamps::default(),
            start_time: Instant::now(),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_report(&self, duration_ms: f64, entries: usize) {
        self.report_reads.fetch_add(1, Ordering::Relaxed);
        self.snapshot_duration_ms.add_sample(duration_ms);
        self.snapshot_entries.add_sample(entries as f64);
    }

    pub fn record_report_failure(&self) {
        self.report_reads.fetch_add(1, Ordering::Relaxed);
        self.report_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Renders the statistics as a plain-text table.
    pub fn render_table(&self) -> String {
        let (sd_cur, sd_avg, sd_max, sd_min, _) = self.snapshot_duration_ms.snapshot();
        let (se_cur, se_avg, se_max, se_min, _) = self.snapshot_entries.snapshot();
        let reads = self.report_reads.load(Ordering::Relaxed);
        let failures = self.report_failures.load(Ordering::Relaxed);
        let last_minute = self.http_request_timestamps.count_last_minute();

        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();
        writeln!(out, "EXPORTER INTERNAL STATS").ok();
        writeln!(out, "=======================").ok();
        writeln!(out).ok();
        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(out, "{}", "-".repeat(left_col + 4 * (col_w + 3))).ok();
        writeln!(
            out,
            "{:left$} | {:>col$.2} | {:>col$.2} | {:>col$.2} | {:>col$.2}",
            "snapshot duration (ms)",
            sd_cur,
            sd_avg,
            sd_max,
            sd_min,
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {:>col$.0} | {:>col$.1} | {:>col$.0} | {:>col$.0}",
            "entries per report",
            se_cur,
            se_avg,
            se_max,
            se_min,
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(out).ok();
        writeln!(out, "{:left$} : {}", "report reads", reads, left = left_col).ok();
        writeln!(out, "{:left$} : {}", "report failures", failures, left = left_col).ok();
        writeln!(
            out,
            "{:left$} : {}",
            "http requests (last 60s)",
            last_minute,
            left = left_col
        )
        .ok();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stat() {
        let mut s = RunningStat::default();
        assert_eq!(s.avg(), 0.0);
        s.add(2.0);
        s.add(4.0);
        s.add(0.0);
        assert_eq!(s.avg(), 2.0);
        assert_eq!(s.min, 0.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.last, 0.0);
    }

    #[test]
    fn test_record_report_and_failure() {
        let stats = HealthStats::new();
        stats.record_report(1.5, 10);
        stats.record_report_failure();
        assert_eq!(stats.report_reads.load(Ordering::Relaxed), 2);
        assert_eq!(stats.report_failures.load(Ordering::Relaxed), 1);

        let table = stats.render_table();
        assert!(table.contains("report reads"));
        assert!(table.contains("snapshot duration (ms)"));
    }

    #[test]
    fn test_request_timestamps() {
        let ts = RequestTimestamps::default();
        ts.record();
        ts.record();
        assert_eq!(ts.count_last_minute(), 2);
    }
}
