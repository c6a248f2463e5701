//! Prometheus metrics endpoint
//!
//! Each request drives the exporter's collection pass: a scrape cycle when
//! the refresh interval has elapsed, then text encoding of every series.

use axum::{
    Extension,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::handlers::AppState;
use crate::middleware::RequestId;

/// Metrics handler for Prometheus scraping
///
/// # Response
///
/// - `200 OK` with metrics in Prometheus text format
/// - `500 Internal Server Error` if encoding fails
///
/// # Example
///
/// ```bash
/// curl http://localhost:9109/metrics
/// # HELP json_up Was the json query successful?
/// # TYPE json_up gauge
/// json_up 1
/// ```
pub async fn handler(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id.map(|Extension(id)| id).unwrap_or_default();
    tracing::debug!(request_id = %request_id, "Collecting metrics");

    match state.exporter().collect().await {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            output,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                "Failed to gather metrics for Prometheus scraping"
            );
            e.into_response()
        }
    }
}
