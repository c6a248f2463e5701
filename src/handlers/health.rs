//! Health check endpoint
//!
//! Reports process liveness plus the availability seen by the last scrape.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// "up" if every URL answered during the last cycle, otherwise "down"
    pub targets: &'static str,
    /// Number of configured URLs
    pub url_count: usize,
}

/// Health check handler
///
/// Always 200 OK while the process is serving; target availability is
/// informational. Does not wait on a running scrape.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let exporter = state.exporter();
    let targets = if exporter.is_up() { "up" } else { "down" };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            targets,
            url_count: exporter.urls().len(),
        }),
    )
}
