//! Outbound HTTP client for JSON documents

use crate::error::{AppError, AppResult};
use serde_json::Value;
use std::time::Duration;

/// Fetches and parses JSON documents
///
/// One attempt per call; the timeout bounds connect and read together.
#[derive(Debug, Clone)]
pub struct JsonClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl JsonClient {
    /// Build a client with the given per-request timeout
    ///
    /// `insecure` disables TLS certificate validation for endpoints with
    /// private certificates.
    pub fn new(timeout: Duration, insecure: bool) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        if insecure {
            tracing::warn!("TLS certificate validation disabled for JSON endpoints");
        }

        Ok(Self { http, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and parse the body as JSON
    ///
    /// # Errors
    ///
    /// - [`AppError::Fetch`] on connection, TLS, timeout or body read failure
    /// - [`AppError::HttpStatus`] on a non-2xx response
    /// - [`AppError::InvalidJson`] when the body does not parse
    pub async fn fetch(&self, url: &str) -> AppResult<Value> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| AppError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| AppError::Fetch {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!(url = %url, bytes = body.len(), "Fetched JSON document");

        serde_json::from_slice(&body).map_err(|source| AppError::InvalidJson {
            url: url.to_string(),
            source,
        })
    }
}
