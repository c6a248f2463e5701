//! Scrape orchestration
//!
//! An [`Exporter`] owns all mutable state behind a single async mutex. A
//! collection request takes the lock, runs a full scrape cycle if the refresh
//! interval has elapsed (fetching every URL in order and walking each
//! document), then encodes the registry. Concurrent requests wait for the
//! running cycle, network I/O included, so generation counting never sees a
//! partial cycle.

use crate::config::{Config, ValueLabelMode};
use crate::error::AppResult;
use crate::fetch::JsonClient;
use crate::filter::NameFilter;
use crate::labels::{ExtractedLabel, LabelRule, LabelStack, PathLabeler, ValueLabelExtractor};
use crate::naming::Normalizer;
use crate::sink::MetricSink;
use crate::walker::{TreeWalker, WalkOptions};
use prometheus::Gauge;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Summary of one scrape cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// URLs fetched successfully (parse failures included)
    pub reachable: usize,
    /// URLs that could not be fetched
    pub unreachable: usize,
    /// Documents that failed to parse
    pub invalid: usize,
    /// Gauge observations recorded
    pub observations: usize,
    /// Series evicted at the end of the cycle
    pub evicted: Vec<String>,
}

impl CycleReport {
    pub fn all_up(&self) -> bool {
        self.unreachable == 0
    }
}

struct ExporterState {
    sink: MetricSink,
    labels: LabelStack,
    next_refresh: Option<Instant>,
    cycles: u64,
}

/// The JSON exporter
pub struct Exporter {
    urls: Vec<String>,
    client: JsonClient,
    interval: Duration,
    options: WalkOptions,
    up: Gauge,
    state: Mutex<ExporterState>,
}

impl Exporter {
    /// Assemble an exporter from its parts
    ///
    /// `base_labels` holds static and value labels; it is attached to every
    /// emitted metric.
    pub fn new(
        urls: Vec<String>,
        client: JsonClient,
        interval: Duration,
        options: WalkOptions,
        sink: MetricSink,
        base_labels: LabelStack,
    ) -> Self {
        let up = sink.up_gauge();
        Self {
            urls,
            client,
            interval,
            options,
            up,
            state: Mutex::new(ExporterState {
                sink,
                labels: base_labels,
                next_refresh: None,
                cycles: 0,
            }),
        }
    }

    /// Build an exporter from validated configuration
    ///
    /// Runs value-label extraction against the configured URLs before
    /// returning, so the labels are in place before the first scrape.
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let client = JsonClient::new(config.scrape.timeout(), config.scrape.insecure)?;
        let normalizer = Normalizer::new(config.metrics.lowercase);
        let filter = NameFilter::from_patterns(
            config.metrics.blacklist.as_deref(),
            config.metrics.whitelist.as_deref(),
        )?;
        let path_rules = LabelRule::compile_all(&config.labels.path_labels, "path")?;
        let value_rules = LabelRule::compile_all(&config.labels.value_labels, "value")?;

        let mut base_labels = LabelStack::from_pairs(
            config
                .labels
                .static_labels
                .iter()
                .map(|l| (normalizer.label_name(&l.name), l.value.clone())),
        );

        let extracted = collect_value_labels(&client, &config.scrape.urls, value_rules).await;
        let mut consumed = std::collections::HashSet::new();
        for label in extracted {
            tracing::info!(
                label = %label.label,
                value = %label.value,
                path = %label.path,
                "Value label extracted"
            );
            base_labels.push(normalizer.label_name(&label.label), label.value);
            if config.labels.value_mode == ValueLabelMode::Consume {
                consumed.insert(label.path);
            }
        }

        let options = WalkOptions {
            normalizer,
            filter,
            path_labels: PathLabeler::new(path_rules),
            jmx: config.metrics.jmx,
            consumed,
        };
        let sink = MetricSink::new(&config.metrics.namespace)?;

        Ok(Self::new(
            config.scrape.urls.clone(),
            client,
            config.scrape.refresh_interval(),
            options,
            sink,
            base_labels,
        ))
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Availability as of the last completed cycle
    pub fn is_up(&self) -> bool {
        self.up.get() >= 1.0
    }

    /// Number of completed scrape cycles
    pub async fn cycles(&self) -> u64 {
        self.state.lock().await.cycles
    }

    /// Serve one collection request
    ///
    /// Scrapes if the refresh interval has elapsed, then encodes all series.
    pub async fn collect(&self) -> AppResult<String> {
        let mut state = self.state.lock().await;

        let due = state.next_refresh.is_none_or(|next| Instant::now() >= next);
        if due {
            let report = self.run_cycle(&mut state).await;
            tracing::info!(
                reachable = report.reachable,
                unreachable = report.unreachable,
                invalid = report.invalid,
                observations = report.observations,
                evicted = report.evicted.len(),
                "Scrape cycle complete"
            );
            state.next_refresh = Some(Instant::now() + self.interval);
        } else {
            tracing::debug!("Within refresh interval, serving cached series");
        }

        Ok(state.sink.gather()?)
    }

    /// Run a scrape cycle now, ignoring the refresh interval
    pub async fn scrape(&self) -> CycleReport {
        let mut state = self.state.lock().await;
        let report = self.run_cycle(&mut state).await;
        state.next_refresh = Some(Instant::now() + self.interval);
        report
    }

    async fn run_cycle(&self, state: &mut ExporterState) -> CycleReport {
        let ExporterState {
            sink,
            labels,
            cycles,
            ..
        } = state;
        let mut report = CycleReport::default();

        sink.begin_cycle();

        for url in &self.urls {
            let document = match self.client.fetch(url).await {
                Ok(document) => {
                    report.reachable += 1;
                    document
                }
                Err(e) if e.is_transport() => {
                    report.unreachable += 1;
                    tracing::warn!(url = %url, error = %e, "Error while querying JSON endpoint");
                    continue;
                }
                Err(e) => {
                    report.reachable += 1;
                    report.invalid += 1;
                    tracing::warn!(url = %url, error = %e, "Failed to parse JSON document");
                    continue;
                }
            };

            let mut walker = TreeWalker::new(&self.options, sink);
            walker.walk_document(&document, labels);
            report.observations += walker.emitted();
        }

        report.evicted = sink.end_cycle();
        sink.set_up(report.all_up());
        *cycles += 1;
        report
    }
}

/// Harvest value labels from the configured URLs, in order
///
/// Stops fetching as soon as every rule has fired. Unreachable or
/// unparsable URLs are skipped.
pub async fn collect_value_labels(
    client: &JsonClient,
    urls: &[String],
    rules: Vec<LabelRule>,
) -> Vec<ExtractedLabel> {
    let mut extractor = ValueLabelExtractor::new(rules);

    for url in urls {
        if extractor.is_done() {
            break;
        }
        match client.fetch(url).await {
            Ok(document) => extractor.extract(&document),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Skipping URL during value label extraction");
            }
        }
    }

    extractor.finish()
}
