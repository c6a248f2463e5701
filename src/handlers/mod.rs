//! HTTP request handlers for the exporter

use crate::exporter::Exporter;
use crate::middleware::request_id_middleware;
use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod health;
pub mod index;
pub mod metrics;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    exporter: Arc<Exporter>,
    metrics_path: Arc<str>,
}

impl AppState {
    pub fn new(exporter: Arc<Exporter>, metrics_path: &str) -> Self {
        Self {
            exporter,
            metrics_path: Arc::from(metrics_path),
        }
    }

    /// Get reference to the exporter
    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Path the metrics handler is mounted on
    pub fn metrics_path(&self) -> &str {
        &self.metrics_path
    }
}

/// Build the application router
///
/// Routes: the configured metrics path, `/health`, and a landing page at `/`.
pub fn app(state: AppState) -> Router {
    let metrics_path = state.metrics_path().to_string();

    Router::new()
        .route(&metrics_path, get(metrics::handler))
        .route("/health", get(health::handler))
        .route("/", get(index::handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
