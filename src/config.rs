//! Configuration management for the JSON exporter
//!
//! Settings come either from a TOML file or from command-line flags (see
//! [`crate::cli`]). Both paths produce a [`Config`] that is checked by
//! [`Config::validate`] before anything is fetched or served.

use crate::error::{AppError, AppResult};
use crate::naming::Normalizer;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            metrics_path: default_metrics_path(),
        }
    }
}

pub(crate) fn default_listen_address() -> String {
    "0.0.0.0:9109".to_string()
}

pub(crate) fn default_metrics_path() -> String {
    "/metrics".to_string()
}

/// JSON source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapeConfig {
    /// Endpoints fetched in order on every cycle
    pub urls: Vec<String>,
    /// Connect + read timeout per request
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Minimum time between scrape cycles; 0 scrapes on every collection
    #[serde(default)]
    pub refresh_interval_seconds: u64,
    /// Skip TLS certificate validation
    #[serde(default)]
    pub insecure: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            timeout_seconds: default_timeout_seconds(),
            refresh_interval_seconds: 0,
            insecure: false,
        }
    }
}

impl ScrapeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

pub(crate) fn default_timeout_seconds() -> u64 {
    5
}

/// Metric naming and filtering
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    /// Treat a record's `name` attribute as its path prefix
    #[serde(default)]
    pub jmx: bool,
    #[serde(default)]
    pub blacklist: Option<String>,
    #[serde(default)]
    pub whitelist: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            lowercase: default_lowercase(),
            jmx: false,
            blacklist: None,
            whitelist: None,
        }
    }
}

pub(crate) fn default_namespace() -> String {
    "json".to_string()
}

fn default_lowercase() -> bool {
    true
}

/// Label configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LabelsConfig {
    /// Labels attached to every metric
    #[serde(default, rename = "static")]
    pub static_labels: Vec<StaticLabel>,
    /// Labels whose values are read once from matching fields
    #[serde(default, rename = "value")]
    pub value_labels: Vec<LabelRuleConfig>,
    /// Labels carved out of matching path segments
    #[serde(default, rename = "path")]
    pub path_labels: Vec<LabelRuleConfig>,
    #[serde(default)]
    pub value_mode: ValueLabelMode,
}

/// A fixed `name = value` label
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StaticLabel {
    pub name: String,
    pub value: String,
}

impl StaticLabel {
    /// Zip parallel comma-separated name and value lists
    ///
    /// Both lists empty means no static labels. Lists of different lengths
    /// are a configuration error.
    pub fn from_lists(names: &str, values: &str) -> AppResult<Vec<Self>> {
        if names.is_empty() && values.is_empty() {
            return Ok(Vec::new());
        }
        if names.is_empty() != values.is_empty() {
            return Err(AppError::Config(
                "static label names and values must be given together".to_string(),
            ));
        }
        let names: Vec<&str> = names.split(',').collect();
        let values: Vec<&str> = values.split(',').collect();
        if names.len() != values.len() {
            return Err(AppError::Config(format!(
                "{} static label names but {} values; the lists must have equal length",
                names.len(),
                values.len()
            )));
        }
        Ok(names
            .into_iter()
            .zip(values)
            .map(|(name, value)| Self {
                name: name.trim().to_string(),
                value: value.to_string(),
            })
            .collect())
    }
}

/// An uncompiled `label:regex` rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LabelRuleConfig {
    pub label: String,
    pub regex: String,
}

impl LabelRuleConfig {
    /// Parse `label:regex[/label:regex...]`
    ///
    /// The first `:` separates label from regex, so regexes may contain `:`
    /// but not `/`.
    pub fn parse_list(spec: &str) -> AppResult<Vec<Self>> {
        if spec.trim().is_empty() {
            return Ok(Vec::new());
        }
        spec.split('/')
            .map(|entry| {
                let (label, regex) = entry.split_once(':').ok_or_else(|| {
                    AppError::Config(format!("label rule {entry:?} is not in label:regex form"))
                })?;
                if label.is_empty() || regex.is_empty() {
                    return Err(AppError::Config(format!(
                        "label rule {entry:?} has an empty label or regex"
                    )));
                }
                Ok(Self {
                    label: label.to_string(),
                    regex: regex.to_string(),
                })
            })
            .collect()
    }
}

/// Whether a field captured as a value label is also exported as a metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValueLabelMode {
    /// Labels come from a startup pre-pass; the field is still exported
    #[default]
    Separate,
    /// The field that supplied a label is never exported
    Consume,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and by the CLI path; call it explicitly when
    /// building a `Config` by hand.
    pub fn validate(&self) -> AppResult<()> {
        if self.scrape.urls.is_empty() {
            return Err(AppError::Config(
                "no URLs configured; pass at least one JSON endpoint".to_string(),
            ));
        }
        for url in &self.scrape.urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "URL {url:?} must start with http:// or https://"
                )));
            }
        }
        if self.scrape.timeout_seconds == 0 {
            return Err(AppError::Config(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if !is_valid_name(&self.metrics.namespace) {
            return Err(AppError::Config(format!(
                "namespace {:?} must match [a-zA-Z_][a-zA-Z0-9_]*",
                self.metrics.namespace
            )));
        }
        if !self.server.metrics_path.starts_with('/') {
            return Err(AppError::Config(format!(
                "metrics_path {:?} must start with '/'",
                self.server.metrics_path
            )));
        }
        if self.server.metrics_path == "/" || self.server.metrics_path == "/health" {
            return Err(AppError::Config(format!(
                "metrics_path {:?} collides with a built-in route",
                self.server.metrics_path
            )));
        }

        for (field, pattern) in [
            ("blacklist", &self.metrics.blacklist),
            ("whitelist", &self.metrics.whitelist),
        ] {
            if let Some(p) = pattern {
                compile(field, p)?;
            }
        }

        for label in &self.labels.static_labels {
            if label.name.is_empty() {
                return Err(AppError::Config("static label with empty name".to_string()));
            }
        }

        for rule in &self.labels.value_labels {
            validate_rule("value", rule)?;
            compile("value label", &rule.regex)?;
        }
        for rule in &self.labels.path_labels {
            validate_rule("path", rule)?;
            let regex = compile("path label", &rule.regex)?;
            if regex.captures_len() < 2 {
                return Err(AppError::Config(format!(
                    "path label {:?} regex {:?} needs a capturing group for the label value",
                    rule.label, rule.regex
                )));
            }
        }

        self.validate_label_names()
    }

    /// Static, value and path labels share one label set per series, so
    /// their names must be unique after normalization.
    fn validate_label_names(&self) -> AppResult<()> {
        let normalizer = Normalizer::new(self.metrics.lowercase);
        let labels = &self.labels;
        let names = labels
            .static_labels
            .iter()
            .map(|l| ("static", l.name.as_str()))
            .chain(labels.value_labels.iter().map(|r| ("value", r.label.as_str())))
            .chain(labels.path_labels.iter().map(|r| ("path", r.label.as_str())));

        let mut seen = HashSet::new();
        for (kind, name) in names {
            if !seen.insert(normalizer.label_name(name)) {
                return Err(AppError::Config(format!(
                    "{kind} label {name:?} defined twice (label names must be unique \
                     across static, value and path labels)"
                )));
            }
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(toml_str).map_err(|source| {
            AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            }
        })?;
        config.validate()?;
        Ok(config)
    }
}

fn validate_rule(kind: &str, rule: &LabelRuleConfig) -> AppResult<()> {
    if rule.label.is_empty() || rule.regex.is_empty() {
        return Err(AppError::Config(format!(
            "{kind} label rule has an empty label or regex"
        )));
    }
    Ok(())
}

fn compile(field: &str, pattern: &str) -> AppResult<Regex> {
    Regex::new(pattern).map_err(|source| AppError::InvalidRegex {
        field: field.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
