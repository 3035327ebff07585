//! Report endpoint handler.
//!
//! Every `GET /{name}` builds a fresh snapshot through the endpoint registry.
//! The snapshot reads procfs synchronously, so it runs on the blocking pool.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use procinfo_exporter::RegistryError;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Error type for report endpoint failures.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to render report: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Report task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReportError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{}\n", self),
        )
            .into_response()
    }
}

/// Handler for the registered report endpoints.
#[instrument(skip(state))]
pub async fn report_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Response, ReportError> {
    debug!("Processing /{} request", name);
    state.health_stats.record_http_request();

    let start = Instant::now();
    let endpoints = state.endpoints.clone();
    let endpoint = name.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<(String, usize), ReportError> {
        let report = endpoints.generate(&endpoint)?;
        let body = report.render()?;
        Ok((body, report.entry_count()))
    })
    .await
    .map_err(ReportError::from)
    .and_then(|r| r);

    match result {
        Ok((body, entries)) => {
            let elapsed = start.elapsed();
            state
                .telemetry
                .record_read(&name, elapsed.as_secs_f64(), entries);
            state
                .health_stats
                .record_report(elapsed.as_secs_f64() * 1000.0, entries);
            debug!(
                "Served /{} with {} entries in {:.2}ms",
                name,
                entries,
                elapsed.as_secs_f64() * 1000.0
            );
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response())
        }
        // Unknown names are not counted; each would create a new label value.
        Err(e @ ReportError::Registry(RegistryError::NotFound(_))) => {
            debug!("No report endpoint named '{}'", name);
            Err(e)
        }
        Err(e) => {
            error!("Report /{} failed: {}", name, e);
            state.telemetry.record_failure(&name);
            state.health_stats.record_report_failure();
            Err(e)
        }
    }
}
