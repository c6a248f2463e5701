//! Integration tests for CLI config handling
//!
//! Tests the `json-exporter config` template, loading it back from disk, and
//! merging `--config` files with positional URLs.

use clap::Parser;
use json_exporter::cli::{Cli, generate_config_template};
use json_exporter::config::{Config, ValueLabelMode};
use std::fs;
use tempfile::TempDir;

/// Helper to create temporary directory for file operations
fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

fn write_template(temp_dir: &TempDir) -> std::path::PathBuf {
    let config_path = temp_dir.path().join("exporter.toml");
    fs::write(&config_path, generate_config_template()).expect("Failed to write template");
    config_path
}

// ─────────────────────────────────────────────────────────────────────────────
// Template Content Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_generated_template_creates_valid_config_file() {
    let temp_dir = create_temp_dir();
    let config_path = write_template(&temp_dir);

    let config =
        Config::from_file(&config_path).expect("Generated template should load as valid Config");

    assert_eq!(config.scrape.urls.len(), 1);
    assert_eq!(config.labels.value_mode, ValueLabelMode::Separate);
    assert!(config.labels.static_labels.is_empty());
    assert!(config.labels.path_labels.is_empty());
}

#[test]
fn test_template_has_all_sections() {
    let template = generate_config_template();

    assert!(template.contains("[server]"), "Missing [server]");
    assert!(template.contains("[scrape]"), "Missing [scrape]");
    assert!(template.contains("[metrics]"), "Missing [metrics]");
    assert!(template.contains("[labels]"), "Missing [labels]");
    assert!(
        template.contains("[observability]"),
        "Missing [observability]"
    );
}

#[test]
fn test_template_documents_label_rules() {
    let template = generate_config_template();

    assert!(template.contains("[[labels.static]]"));
    assert!(template.contains("[[labels.value]]"));
    assert!(template.contains("[[labels.path]]"));
    assert!(template.contains("capture group"));
}

#[test]
fn test_template_roundtrip_preserves_defaults() {
    let temp_dir = create_temp_dir();
    let config_path = write_template(&temp_dir);

    let config = Config::from_file(&config_path).expect("Failed to load config");

    assert_eq!(config.server.listen_address, "0.0.0.0:9109");
    assert_eq!(config.server.metrics_path, "/metrics");
    assert_eq!(config.scrape.timeout_seconds, 5);
    assert_eq!(config.scrape.refresh_interval_seconds, 0);
    assert_eq!(config.metrics.namespace, "json");
    assert!(config.metrics.lowercase);
    assert!(!config.metrics.jmx);
    assert_eq!(config.observability.log_level, "info");
}

// ─────────────────────────────────────────────────────────────────────────────
// --config Flag Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_flag_appends_positional_urls() {
    let temp_dir = create_temp_dir();
    let config_path = write_template(&temp_dir);

    let cli = Cli::parse_from([
        "json-exporter",
        "--config",
        config_path.to_str().unwrap(),
        "http://localhost:8080/stats",
    ]);
    let config = cli.into_config().expect("config should load");

    assert_eq!(
        config.scrape.urls,
        vec![
            "http://localhost:9200/_cluster/stats".to_string(),
            "http://localhost:8080/stats".to_string(),
        ]
    );
}

#[test]
fn test_config_flag_rejects_bad_positional_url() {
    let temp_dir = create_temp_dir();
    let config_path = write_template(&temp_dir);

    let cli = Cli::parse_from([
        "json-exporter",
        "--config",
        config_path.to_str().unwrap(),
        "localhost:8080/stats",
    ]);

    assert!(cli.into_config().is_err());
}

#[test]
fn test_config_flag_with_debug_raises_log_level() {
    let temp_dir = create_temp_dir();
    let config_path = write_template(&temp_dir);

    let cli = Cli::parse_from([
        "json-exporter",
        "--debug",
        "--config",
        config_path.to_str().unwrap(),
    ]);
    let config = cli.into_config().expect("config should load");

    assert_eq!(config.observability.log_level, "debug");
}

#[test]
fn test_missing_config_file_reports_path() {
    let temp_dir = create_temp_dir();
    let missing = temp_dir.path().join("absent.toml");

    let cli = Cli::parse_from(["json-exporter", "--config", missing.to_str().unwrap()]);
    let err = cli.into_config().expect_err("missing file must fail");

    assert!(
        err.to_string().contains("absent.toml"),
        "error should name the file: {err}"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// File Operation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_write_to_nonexistent_parent_fails() {
    let temp_dir = create_temp_dir();
    let bad_path = temp_dir.path().join("nonexistent").join("exporter.toml");

    let result = fs::write(&bad_path, generate_config_template());
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), std::io::ErrorKind::NotFound);
}
