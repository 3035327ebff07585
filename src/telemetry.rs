//! Prometheus self-telemetry for procinfo-exporter.
//!
//! Only the exporter's own behaviour is exposed here (reads, failures,
//! snapshot cost). Process data is served exclusively by the JSON reports.

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};

/// Collection of self-telemetry metrics, labelled by endpoint name.
#[derive(Clone)]
pub struct Telemetry {
    pub registry: Registry,
    pub reads_total: CounterVec,
    pub read_failures_total: CounterVec,
    pub snapshot_duration_seconds: GaugeVec,
    pub snapshot_entries: GaugeVec,
}

impl Telemetry {
    /// Creates and registers all metrics with a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let reads_total = CounterVec::new(
            Opts::new(
                "procinfo_exporter_reads_total",
                "Number of report reads served, per endpoint",
            ),
            &["endpoint"],
        )?;
        let read_failures_total = CounterVec::new(
            Opts::new(
                "procinfo_exporter_read_failures_total",
                "Number of report reads that failed, per endpoint",
            ),
            &["endpoint"],
        )?;
        let snapshot_duration_seconds = GaugeVec::new(
            Opts::new(
                "procinfo_exporter_snapshot_duration_seconds",
                "Time spent building the last snapshot, per endpoint",
            ),
            &["endpoint"],
        )?;
        let snapshot_entries = GaugeVec::new(
            Opts::new(
                "procinfo_exporter_snapshot_entries",
                "Number of process entries in the last report, per endpoint",
            ),
            &["endpoint"],
        )?;

        registry.register(Box::new(reads_total.clone()))?;
        registry.register(Box::new(read_failures_total.clone()))?;
        registry.register(Box::new(snapshot_duration_seconds.clone()))?;
        registry.register(Box::new(snapshot_entries.clone()))?;

        Ok(Self {
            registry,
            reads_total,
            read_failures_total,
            snapshot_duration_seconds,
            snapshot_entries,
        })
    }

    pub fn record_read(&self, endpoint: &str, duration_seconds: f64, entries: usize) {
        self.reads_total.with_label_values(&[endpoint]).inc();
        self.snapshot_duration_seconds
            .with_label_values(&[endpoint])
            .set(duration_seconds);
        self.snapshot_entries
            .with_label_values(&[endpoint])
            .set(entries as f64);
    }

    pub fn record_failure(&self, endpoint: &str) {
        self.reads_total.with_label_values(&[endpoint]).inc();
        self.read_failures_total.with_label_values(&[endpoint]).inc();
    }

    /// Prometheus text exposition of all metrics.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
