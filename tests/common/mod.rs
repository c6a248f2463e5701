//! Shared helpers for exporter integration tests

#![allow(dead_code)]

use json_exporter::config::Config;
use json_exporter::exporter::Exporter;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Port 9 (discard) is closed on test machines, so connections are refused
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9/stats";

/// Mount `body` as the JSON response for GET `route`
pub async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Build a validated config from a `[scrape]`-less TOML fragment plus URLs
pub fn config_with(urls: &[String], extra: &str) -> Config {
    let url_list = urls
        .iter()
        .map(|u| format!("\"{u}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let toml = format!(
        "{extra}\n\n[scrape]\nurls = [{url_list}]\ntimeout_seconds = 2\n",
    );
    toml.parse().expect("test config should be valid")
}

pub async fn exporter_for(urls: &[String], extra: &str) -> Exporter {
    Exporter::from_config(&config_with(urls, extra))
        .await
        .expect("exporter should build")
}

/// Lines of the exposition text that are samples (no HELP/TYPE comments)
pub fn samples(text: &str) -> Vec<&str> {
    text.lines().filter(|l| !l.starts_with('#')).collect()
}
