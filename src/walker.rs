//! Recursive JSON-to-gauge extraction
//!
//! The walker descends objects and arrays, building an `_`-joined path from
//! keys and indices. At every child node it first applies path labels, then
//! dispatches on the value:
//!
//! - numbers become gauges at the current path
//! - booleans become gauges of `1` or `0`
//! - strings starting with `{` are parsed and walked as an embedded object
//!   rooted at the current path; any other string is ignored
//! - objects and arrays are walked with the current path as prefix
//! - `null` is ignored
//!
//! Path labels pushed at a node live exactly as long as that node's subtree.

use crate::filter::NameFilter;
use crate::labels::{LabelStack, PathLabeler};
use crate::naming::{self, Normalizer};
use crate::sink::MetricSink;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Settings that shape metric extraction
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub normalizer: Normalizer,
    pub filter: NameFilter,
    pub path_labels: PathLabeler,
    /// Use a record's `name` attribute as its path prefix
    pub jmx: bool,
    /// Raw paths whose values were taken as value labels and must not be
    /// emitted as metrics
    pub consumed: HashSet<String>,
}

/// Walks one document into a [`MetricSink`]
pub struct TreeWalker<'a> {
    options: &'a WalkOptions,
    sink: &'a mut MetricSink,
    emitted: usize,
}

impl<'a> TreeWalker<'a> {
    pub fn new(options: &'a WalkOptions, sink: &'a mut MetricSink) -> Self {
        Self {
            options,
            sink,
            emitted: 0,
        }
    }

    /// Number of observations written to the sink so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Walk a whole document with `labels` as the base label set
    ///
    /// The stack is returned to its original depth when the walk finishes.
    pub fn walk_document(&mut self, document: &Value, labels: &mut LabelStack) {
        match document {
            Value::Object(map) => self.walk_object("", map, labels),
            Value::Array(items) => self.walk_array("", items, labels),
            other => tracing::debug!(
                kind = kind(other),
                "Document root is a scalar, nothing to extract"
            ),
        }
    }

    fn walk_object(&mut self, prefix: &str, map: &Map<String, Value>, labels: &mut LabelStack) {
        let jmx_prefix = if self.options.jmx {
            match map.get("name") {
                Some(Value::String(name)) => Some(naming::jmx_prefix(name)),
                _ => None,
            }
        } else {
            None
        };
        let prefix = jmx_prefix.as_deref().unwrap_or(prefix);

        for (key, value) in map {
            self.visit(naming::join(prefix, key), value, labels);
        }
    }

    fn walk_array(&mut self, prefix: &str, items: &[Value], labels: &mut LabelStack) {
        for (index, value) in items.iter().enumerate() {
            self.visit(naming::join(prefix, &index.to_string()), value, labels);
        }
    }

    fn visit(&mut self, raw_path: String, value: &Value, labels: &mut LabelStack) {
        let consumed = self.options.consumed.contains(&raw_path);
        let matched = self.options.path_labels.apply(raw_path);
        let path = matched.path;

        let mut scope = labels.scope();
        for (label, label_value) in matched.labels {
            scope.push(self.options.normalizer.label_name(&label), label_value);
        }

        match value {
            Value::Null => tracing::trace!(path = %path, "Skipping null"),
            Value::Bool(b) => {
                if !consumed {
                    self.emit(&path, if *b { 1.0 } else { 0.0 }, &scope);
                }
            }
            Value::Number(n) => match n.as_f64() {
                Some(v) if !consumed => self.emit(&path, v, &scope),
                Some(_) => tracing::trace!(path = %path, "Skipping field consumed as value label"),
                None => tracing::debug!(path = %path, number = %n, "Number not representable as f64"),
            },
            Value::String(s) => {
                if s.starts_with('{') {
                    match serde_json::from_str::<Map<String, Value>>(s) {
                        Ok(embedded) => {
                            tracing::debug!(path = %path, "Extracting JSON embedded in string");
                            self.walk_object(&path, &embedded, &mut scope);
                        }
                        Err(e) => tracing::warn!(
                            path = %path,
                            error = %e,
                            "Failed to parse JSON embedded in string"
                        ),
                    }
                } else {
                    tracing::trace!(path = %path, "Skipping plain string");
                }
            }
            Value::Object(map) => self.walk_object(&path, map, &mut scope),
            Value::Array(items) => self.walk_array(&path, items, &mut scope),
        }
    }

    fn emit(&mut self, path: &str, value: f64, labels: &LabelStack) {
        let name = self.options.normalizer.metric_name(path);
        if !self.options.filter.allow(&name) {
            tracing::trace!(metric = %name, "Metric filtered out");
            return;
        }

        tracing::trace!(metric = %name, value, labels = ?labels.names(), "Observed gauge");
        match self
            .sink
            .observe(&name, value, labels.names(), labels.values())
        {
            Ok(()) => self.emitted += 1,
            Err(e) => tracing::warn!(metric = %name, error = %e, "Failed to record metric"),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelRule;
    use regex::Regex;
    use serde_json::json;

    fn walk(options: &WalkOptions, doc: &Value, labels: &mut LabelStack) -> MetricSink {
        let mut sink = MetricSink::new("json").unwrap();
        TreeWalker::new(options, &mut sink).walk_document(doc, labels);
        sink
    }

    fn path_rules(rules: &[(&str, &str)]) -> PathLabeler {
        PathLabeler::new(
            rules
                .iter()
                .map(|(l, r)| LabelRule::new(*l, Regex::new(r).unwrap()))
                .collect(),
        )
    }

    #[test]
    fn test_basic_document() {
        let doc = json!({"a": {"b": 5, "c": "hi"}, "d": [1, 2]});
        let sink = walk(&WalkOptions::default(), &doc, &mut LabelStack::new());

        assert_eq!(sink.value("a_b", &[]), Some(5.0));
        assert_eq!(sink.value("d_0", &[]), Some(1.0));
        assert_eq!(sink.value("d_1", &[]), Some(2.0));
        assert!(!sink.contains("a_c"));
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn test_booleans_and_nulls() {
        let doc = json!({"ok": true, "failed": false, "gone": null});
        let sink = walk(&WalkOptions::default(), &doc, &mut LabelStack::new());
        assert_eq!(sink.value("ok", &[]), Some(1.0));
        assert_eq!(sink.value("failed", &[]), Some(0.0));
        assert!(!sink.contains("gone"));
    }

    #[test]
    fn test_embedded_json_matches_native_nesting() {
        let embedded = json!({"stats": "{\"hits\": 3, \"inner\": {\"misses\": 1}}"});
        let native = json!({"stats": {"hits": 3, "inner": {"misses": 1}}});

        let a = walk(&WalkOptions::default(), &embedded, &mut LabelStack::new());
        let b = walk(&WalkOptions::default(), &native, &mut LabelStack::new());
        assert_eq!(a.gather().unwrap(), b.gather().unwrap());
        assert_eq!(a.value("stats_inner_misses", &[]), Some(1.0));
    }

    #[test]
    fn test_malformed_embedded_json_is_skipped() {
        let doc = json!({"stats": "{not json", "n": 1});
        let sink = walk(&WalkOptions::default(), &doc, &mut LabelStack::new());
        assert_eq!(sink.len(), 1);
        assert!(sink.contains("n"));
    }

    #[test]
    fn test_static_labels_attached() {
        let mut labels = LabelStack::from_pairs([("env", "prod")]);
        let sink = walk(&WalkOptions::default(), &json!({"x": 1}), &mut labels);
        assert_eq!(sink.value("x", &["prod"]), Some(1.0));
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn test_path_labels_scoped_to_subtree() {
        let options = WalkOptions {
            path_labels: path_rules(&[("node", "^nodes_([^_]+)")]),
            ..Default::default()
        };
        let doc = json!({
            "nodes": {"n1": {"heap": 10}, "n2": {"heap": 20}},
            "cluster": {"heap": 30}
        });
        let mut labels = LabelStack::new();
        let sink = walk(&options, &doc, &mut labels);

        // "nodes_n1" is wholly consumed, so the prefix becomes the label name
        assert_eq!(sink.value("node_heap", &["n1"]), Some(10.0));
        assert_eq!(sink.value("node_heap", &["n2"]), Some(20.0));
        assert_eq!(sink.value("cluster_heap", &[]), Some(30.0));
        assert!(labels.is_empty());
    }

    #[test]
    fn test_path_label_emptying_path_uses_label_name() {
        let options = WalkOptions {
            path_labels: path_rules(&[("index", "^indices_(.+)$")]),
            ..Default::default()
        };
        let doc = json!({"indices": {"logs": 4}});
        let sink = walk(&options, &doc, &mut LabelStack::new());
        assert!(!sink.contains("indices"));
        assert_eq!(sink.value("index", &["logs"]), Some(4.0));
    }

    #[test]
    fn test_filter_applied_to_normalized_name() {
        let options = WalkOptions {
            filter: NameFilter::from_patterns(Some("^d_"), None).unwrap(),
            ..Default::default()
        };
        let doc = json!({"a": {"b": 5}, "d": [1, 2]});
        let sink = walk(&options, &doc, &mut LabelStack::new());
        assert!(sink.contains("a_b"));
        assert!(!sink.contains("d_0"));
        assert!(!sink.contains("d_1"));
    }

    #[test]
    fn test_lowercase_normalization() {
        let doc = json!({"JVM": {"Heap-Used": 1}});
        let sink = walk(&WalkOptions::default(), &doc, &mut LabelStack::new());
        assert!(sink.contains("jvm_heap_used"));

        let options = WalkOptions {
            normalizer: Normalizer::new(false),
            ..Default::default()
        };
        let sink = walk(&options, &doc, &mut LabelStack::new());
        assert!(sink.contains("JVM_Heap_Used"));
    }

    #[test]
    fn test_jmx_name_replaces_prefix() {
        let options = WalkOptions {
            jmx: true,
            ..Default::default()
        };
        let doc = json!({"beans": [
            {"name": "java.lang:type=Memory", "HeapUsed": 100},
            {"name": "java.lang:type=Threading", "ThreadCount": 12}
        ]});
        let sink = walk(&options, &doc, &mut LabelStack::new());
        assert_eq!(sink.value("java_lang_type_memory_heapused", &[]), Some(100.0));
        assert_eq!(sink.value("java_lang_type_threading_threadcount", &[]), Some(12.0));
    }

    #[test]
    fn test_consumed_paths_not_emitted() {
        let options = WalkOptions {
            consumed: HashSet::from(["a_b".to_string()]),
            ..Default::default()
        };
        let doc = json!({"a": {"b": 5, "e": 6}});
        let sink = walk(&options, &doc, &mut LabelStack::new());
        assert!(!sink.contains("a_b"));
        assert!(sink.contains("a_e"));
    }

    #[test]
    fn test_top_level_array_and_scalar() {
        let sink = walk(&WalkOptions::default(), &json!([7, 8]), &mut LabelStack::new());
        assert_eq!(sink.value("0", &[]), Some(7.0));

        let sink = walk(&WalkOptions::default(), &json!(42), &mut LabelStack::new());
        assert!(sink.is_empty());
    }
}
