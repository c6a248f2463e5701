//! Gauge series storage and stale-series eviction
//!
//! Every metric name seen in a document gets its own `GaugeVec`, created on
//! first observation and registered with the sink's private registry. Each
//! name carries a generation counter: it is zeroed by [`MetricSink::begin_cycle`],
//! incremented on every observation, and checked by [`MetricSink::end_cycle`].
//! A name whose counter did not move during the cycle vanished from every
//! document and is unregistered. Label combinations of a surviving name that
//! were not refreshed are removed from its vector.

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::{HashMap, HashSet};

/// Suffix appended to the help text of every exported JSON gauge
pub const HELP_SUFFIX: &str = " json_exporter exported metric";

struct GaugeSeries {
    vec: GaugeVec,
    label_names: Vec<String>,
    /// Observations during the current cycle
    generation: u64,
    touched: HashSet<Vec<String>>,
    known: HashSet<Vec<String>>,
}

/// Owner of all exported gauge series
pub struct MetricSink {
    namespace: String,
    registry: Registry,
    up: Gauge,
    series: HashMap<String, GaugeSeries>,
}

impl MetricSink {
    /// Create a sink with a fresh registry and the `<namespace>_up` gauge
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace yields an invalid metric name.
    pub fn new(namespace: &str) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let up = Gauge::with_opts(
            Opts::new("up", "Was the json query successful?").namespace(namespace),
        )?;
        registry.register(Box::new(up.clone()))?;

        Ok(Self {
            namespace: namespace.to_string(),
            registry,
            up,
            series: HashMap::new(),
        })
    }

    /// Handle to the availability gauge
    pub fn up_gauge(&self) -> Gauge {
        self.up.clone()
    }

    pub fn set_up(&self, up: bool) {
        self.up.set(if up { 1.0 } else { 0.0 });
    }

    /// Record a value for `name` under the given label set
    ///
    /// # Errors
    ///
    /// Returns an error if the series cannot be created (invalid or colliding
    /// name, duplicate label names) or if `label_names` differs from the
    /// names the series was created with.
    pub fn observe(
        &mut self,
        name: &str,
        value: f64,
        label_names: &[String],
        label_values: &[String],
    ) -> Result<(), prometheus::Error> {
        if !self.series.contains_key(name) {
            let series = self.create_series(name, label_names)?;
            self.series.insert(name.to_string(), series);
        }
        let Some(series) = self.series.get_mut(name) else {
            return Err(prometheus::Error::Msg(format!(
                "series {name} missing after creation"
            )));
        };

        if series.label_names != label_names {
            return Err(prometheus::Error::Msg(format!(
                "metric {} was created with labels {:?}, observed with {:?}",
                name, series.label_names, label_names
            )));
        }

        let values: Vec<&str> = label_values.iter().map(String::as_str).collect();
        series.vec.get_metric_with_label_values(&values)?.set(value);
        series.generation += 1;
        series.touched.insert(label_values.to_vec());
        series.known.insert(label_values.to_vec());
        Ok(())
    }

    fn create_series(
        &self,
        name: &str,
        label_names: &[String],
    ) -> Result<GaugeSeries, prometheus::Error> {
        let opts = Opts::new(name, format!("{name}{HELP_SUFFIX}")).namespace(&self.namespace);
        let names: Vec<&str> = label_names.iter().map(String::as_str).collect();
        let vec = GaugeVec::new(opts, &names)?;
        self.registry.register(Box::new(vec.clone()))?;

        tracing::debug!(metric = %name, labels = ?label_names, "Created gauge series");

        Ok(GaugeSeries {
            vec,
            label_names: label_names.to_vec(),
            generation: 0,
            touched: HashSet::new(),
            known: HashSet::new(),
        })
    }

    /// Start a scrape cycle: zero every live generation counter
    pub fn begin_cycle(&mut self) {
        for series in self.series.values_mut() {
            series.generation = 0;
            series.touched.clear();
        }
    }

    /// Finish a scrape cycle, evicting series that were not observed
    ///
    /// Returns the evicted metric names in sorted order.
    pub fn end_cycle(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();

        for (name, series) in self.series.iter_mut() {
            if series.generation == 0 {
                evicted.push(name.clone());
                continue;
            }

            for stale in series.known.difference(&series.touched) {
                let values: Vec<&str> = stale.iter().map(String::as_str).collect();
                if let Err(e) = series.vec.remove_label_values(&values) {
                    tracing::warn!(metric = %name, error = %e, "Failed to remove stale label set");
                }
            }
            series.known = series.touched.clone();
        }

        for name in &evicted {
            if let Some(series) = self.series.remove(name)
                && let Err(e) = self.registry.unregister(Box::new(series.vec))
            {
                tracing::warn!(metric = %name, error = %e, "Failed to unregister evicted series");
            }
            tracing::debug!(metric = %name, "Evicted series absent from latest cycle");
        }

        evicted.sort();
        evicted
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Observations of `name` during the current cycle
    pub fn generation(&self, name: &str) -> Option<u64> {
        self.series.get(name).map(|s| s.generation)
    }

    /// Current value of `name` for the given label values
    pub fn value(&self, name: &str, label_values: &[&str]) -> Option<f64> {
        let series = self.series.get(name)?;
        let present = series
            .known
            .iter()
            .any(|k| k.iter().map(String::as_str).eq(label_values.iter().copied()));
        if !present {
            return None;
        }
        series
            .vec
            .get_metric_with_label_values(label_values)
            .ok()
            .map(|g| g.get())
    }

    /// Gather all metrics and encode them in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_count,
                    "Prometheus text encoder failed"
                );
                e
            })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                e.utf8_error().valid_up_to(),
                e
            ))
        })
    }
}
