//! Command-line interface for the JSON exporter
//!
//! Flags map one-to-one onto [`Config`]. With `--config`, settings are read
//! from a TOML file instead and only positional URLs are merged in.

use crate::config::{
    Config, LabelRuleConfig, LabelsConfig, MetricsConfig, ObservabilityConfig, ScrapeConfig,
    ServerConfig, StaticLabel, ValueLabelMode, default_listen_address, default_metrics_path,
    default_namespace, default_timeout_seconds,
};
use crate::error::AppResult;
use clap::{ArgAction, Parser, Subcommand};

/// Export JSON endpoints as Prometheus gauges
#[derive(Parser, Debug)]
#[command(name = "json-exporter")]
#[command(version)]
#[command(about = "Export JSON endpoints as Prometheus gauges")]
#[command(
    long_about = "Fetches JSON documents from one or more URLs and exposes every numeric \
    and boolean leaf as a gauge. Usage: json-exporter [options] <URL1> [<URL2> ...]"
)]
pub struct Cli {
    /// JSON endpoints to scrape
    pub urls: Vec<String>,

    /// Read settings from a TOML file (other flags are ignored)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Address to listen on for the metrics endpoint
    #[arg(long, default_value_t = default_listen_address())]
    pub listen_address: String,

    /// Path under which to expose metrics
    #[arg(long, default_value_t = default_metrics_path())]
    pub metrics_path: String,

    /// Namespace prefix for exported metrics
    #[arg(long, default_value_t = default_namespace())]
    pub namespace: String,

    /// Static label names (comma separated)
    #[arg(long, default_value = "")]
    pub labels: String,

    /// Static label values (comma separated, same count as --labels)
    #[arg(long, default_value = "")]
    pub values: String,

    /// Timeout in seconds for each JSON request
    #[arg(long, default_value_t = default_timeout_seconds())]
    pub timeout: u64,

    /// Minimum seconds between scrapes (0 scrapes on every collection)
    #[arg(long, default_value_t = 0)]
    pub interval: u64,

    /// Log debug information
    #[arg(long)]
    pub debug: bool,

    /// Lowercase metric and label names
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub lowercase: bool,

    /// Use a record's `name` attribute as its metric path prefix
    #[arg(long)]
    pub jmx: bool,

    /// Accept untrusted HTTPS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Regex of metric names to drop
    #[arg(long)]
    pub blacklist: Option<String>,

    /// Regex of metric names to keep
    #[arg(long)]
    pub whitelist: Option<String>,

    /// Labels from field values: <label>:<regex>[/<label>:<regex>...]
    #[arg(long, default_value = "")]
    pub value_label: String,

    /// Labels from path segments: <label>:<regex>[/<label>:<regex>...]
    #[arg(long, default_value = "")]
    pub path_label: String,

    /// Whether fields captured as value labels are still exported
    #[arg(long, value_enum, default_value_t = ValueLabelMode::Separate)]
    pub value_label_mode: ValueLabelMode,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    /// Build and validate the effective configuration
    pub fn into_config(self) -> AppResult<Config> {
        if let Some(path) = &self.config {
            let mut config = Config::from_file(path)?;
            if !self.urls.is_empty() {
                config.scrape.urls.extend(self.urls);
                config.validate()?;
            }
            if self.debug {
                config.observability.log_level = "debug".to_string();
            }
            return Ok(config);
        }

        let config = Config {
            server: ServerConfig {
                listen_address: self.listen_address,
                metrics_path: self.metrics_path,
            },
            scrape: ScrapeConfig {
                urls: self.urls,
                timeout_seconds: self.timeout,
                refresh_interval_seconds: self.interval,
                insecure: self.insecure,
            },
            metrics: MetricsConfig {
                namespace: self.namespace,
                lowercase: self.lowercase,
                jmx: self.jmx,
                blacklist: self.blacklist.filter(|p| !p.is_empty()),
                whitelist: self.whitelist.filter(|p| !p.is_empty()),
            },
            labels: LabelsConfig {
                static_labels: StaticLabel::from_lists(&self.labels, &self.values)?,
                value_labels: LabelRuleConfig::parse_list(&self.value_label)?,
                path_labels: LabelRuleConfig::parse_list(&self.path_label)?,
                value_mode: self.value_label_mode,
            },
            observability: ObservabilityConfig {
                log_level: if self.debug { "debug" } else { "info" }.to_string(),
            },
        };
        config.validate()?;
        Ok(config)
    }
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# JSON Exporter Configuration
# ===========================
#
# Every numeric or boolean leaf of the fetched JSON documents is exported as
# a gauge named after its path, e.g. {"indices": {"docs": {"count": 5}}}
# becomes json_indices_docs_count 5.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# Address and port for the metrics listener
listen_address = "0.0.0.0:9109"

# Path under which metrics are exposed
metrics_path = "/metrics"

# ─────────────────────────────────────────────────────────────────────────────
# SCRAPING
# ─────────────────────────────────────────────────────────────────────────────

[scrape]
# JSON endpoints, fetched in order on every scrape cycle
urls = ["http://localhost:9200/_cluster/stats"]

# Connect + read timeout per request, in seconds
timeout_seconds = 5

# Minimum seconds between scrape cycles. Collections inside the interval
# return the previous results. 0 scrapes on every collection.
refresh_interval_seconds = 0

# Accept untrusted HTTPS certificates
insecure = false

# ─────────────────────────────────────────────────────────────────────────────
# METRIC NAMES
# ─────────────────────────────────────────────────────────────────────────────

[metrics]
# Prefix for every exported metric
namespace = "json"

# Lowercase metric and label names
lowercase = true

# Use a record's "name" attribute as its path prefix (JMX-style bean lists)
jmx = false

# Drop metric names matching this regex (wins over whitelist)
# blacklist = "_ip$"

# Keep only metric names matching this regex
# whitelist = "^indices_"

# ─────────────────────────────────────────────────────────────────────────────
# LABELS
# ─────────────────────────────────────────────────────────────────────────────

[labels]
# "separate": fields captured as value labels are still exported
# "consume": fields captured as value labels are not exported
value_mode = "separate"

# Static labels attached to every metric
# [[labels.static]]
# name = "env"
# value = "prod"

# Value labels: read once at startup from the first field whose path matches
# [[labels.value]]
# label = "cluster"
# regex = "^cluster_name$"

# Path labels: the first capture group becomes the label value and the
# matched text is removed from the metric name
# [[labels.path]]
# label = "node"
# regex = "^nodes_nodes_([^_]+)"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"
"#
}
