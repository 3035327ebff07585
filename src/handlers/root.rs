//! Root endpoint handler.
//!
//! `GET /` lists the registered report endpoints next to the auxiliary ones.

use axum::{extract::State, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;

    let mut out = String::new();
    writeln!(
        out,
        "procinfo-exporter {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_BUILD_TIMESTAMP")
    )
    .ok();
    writeln!(out, "Uptime: {}h {}m {}s", hours, minutes, seconds).ok();
    writeln!(out).ok();
    writeln!(out, "Report endpoints:").ok();
    for (name, kind) in state.endpoints.endpoints() {
        writeln!(out, "  /{:<20} {} report (JSON)", name, kind).ok();
    }

    writeln!(out).ok();
    writeln!(out, "Other endpoints:").ok();
    if state.config.enable_health.unwrap_or(true) {
        writeln!(out, "  /{:<20} exporter health", "health").ok();
    }
    if state.config.enable_telemetry.unwrap_or(true) {
        writeln!(out, "  /{:<20} exporter self-telemetry (Prometheus)", "metrics").ok();
    }

    ([("Content-Type", "text/plain; charset=utf-8")], out)
}
