//! HTTP endpoint handlers for the exporter.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Plain-text index of the registered report endpoints
//! - `/{name}`: JSON report registered under `name`
//! - `/health`: Health check endpoint
//! - `/metrics`: Prometheus self-telemetry endpoint

pub mod health;
pub mod metrics;
pub mod report;
pub mod root;

// Re-export handlers
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use report::report_handler;
pub use root::root_handler;

use axum::{routing::get, Router};

use crate::state::SharedState;

/// Builds the HTTP router. `/health` and `/metrics` are routed only when
/// enabled in the config.
pub fn build_router(state: SharedState) -> Router {
    let mut app = Router::new().route("/", get(root_handler));

    if state.config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }
    if state.config.enable_telemetry.unwrap_or(true) {
        app = app.route("/metrics", get(metrics_handler));
    }

    // Static routes above take precedence over the catch-all report route.
    app.route("/{name}", get(report_handler)).with_state(state)
}
