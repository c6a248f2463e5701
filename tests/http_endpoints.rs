//! Integration tests for the HTTP surface
//!
//! Drives the full router (request IDs, tracing, handlers) with
//! `tower::ServiceExt::oneshot`.

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{UNREACHABLE_URL, exporter_for, mount_json};
use json_exporter::handlers::{self, AppState};
use json_exporter::middleware::REQUEST_ID_HEADER;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::MockServer;

async fn create_test_app(urls: &[String], metrics_path: &str) -> Router {
    let exporter = exporter_for(urls, "").await;
    handlers::app(AppState::new(Arc::new(exporter), metrics_path))
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_metrics_endpoint_serves_prometheus_text() {
    let server = MockServer::start().await;
    mount_json(&server, "/stats", json!({"a": {"b": 5}})).await;
    let app = create_test_app(&[format!("{}/stats", server.uri())], "/metrics").await;

    let response = get(app, "/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"), "got {content_type}");

    let body = body_string(response).await;
    assert!(body.contains("json_a_b 5"), "got:\n{body}");
    assert!(body.contains("json_up 1"), "got:\n{body}");
}

#[tokio::test]
async fn test_custom_metrics_path() {
    let server = MockServer::start().await;
    mount_json(&server, "/stats", json!({"a": 1})).await;
    let app = create_test_app(&[format!("{}/stats", server.uri())], "/probe").await;

    let response = get(app.clone(), "/probe").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app, "/metrics").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint_reports_down_target_with_200() {
    let app = create_test_app(&[UNREACHABLE_URL.to_string()], "/metrics").await;

    let response = get(app, "/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("json_up 0"), "got:\n{body}");
}

#[tokio::test]
async fn test_health_reflects_last_cycle() {
    let server = MockServer::start().await;
    mount_json(&server, "/stats", json!({"a": 1})).await;
    let app = create_test_app(&[format!("{}/stats", server.uri())], "/metrics").await;

    let before: Value =
        serde_json::from_str(&body_string(get(app.clone(), "/health").await).await).unwrap();
    assert_eq!(before["status"], "OK");
    assert_eq!(before["targets"], "down");
    assert_eq!(before["url_count"], 1);

    let response = get(app.clone(), "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);

    let after: Value =
        serde_json::from_str(&body_string(get(app, "/health").await).await).unwrap();
    assert_eq!(after["targets"], "up");
}

#[tokio::test]
async fn test_landing_page_links_metrics_path() {
    let app = create_test_app(&[UNREACHABLE_URL.to_string()], "/probe").await;

    let response = get(app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("<a href='/probe'>"), "got:\n{body}");
}

#[tokio::test]
async fn test_request_id_is_generated_and_echoed() {
    let app = create_test_app(&[UNREACHABLE_URL.to_string()], "/metrics").await;

    let response = get(app.clone(), "/health").await;
    let generated = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .expect("response should carry a request id");
    assert!(uuid::Uuid::parse_str(generated.to_str().unwrap()).is_ok());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(REQUEST_ID_HEADER, "scrape-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "scrape-123"
    );
}
