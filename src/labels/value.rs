//! Labels harvested once from field values
//!
//! Runs before the exporter starts serving. Each rule fires at most once:
//! the first field (first URL, then map order) whose path matches takes the
//! label, and the rule leaves the pending set whether or not the field held a
//! scalar. Rules that never match produce no label.

use super::LabelRule;
use crate::naming;
use serde_json::{Map, Number, Value};

/// A label captured from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLabel {
    pub label: String,
    pub value: String,
    /// Path of the field the value came from
    pub path: String,
}

/// Pending value-label rules
#[derive(Debug, Clone, Default)]
pub struct ValueLabelExtractor {
    pending: Vec<LabelRule>,
    extracted: Vec<ExtractedLabel>,
}

impl ValueLabelExtractor {
    pub fn new(rules: Vec<LabelRule>) -> Self {
        Self {
            pending: rules,
            extracted: Vec::new(),
        }
    }

    /// True once every rule has fired
    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(LabelRule::label)
    }

    /// Walk one document, consuming any rules that match
    pub fn extract(&mut self, document: &Value) {
        if let Value::Object(map) = document {
            self.walk("", map);
        }
    }

    /// Labels captured so far, in capture order
    pub fn finish(self) -> Vec<ExtractedLabel> {
        for label in &self.pending {
            tracing::debug!(label = %label.label(), "Value label never matched, dropping it");
        }
        self.extracted
    }

    fn walk(&mut self, prefix: &str, map: &Map<String, Value>) {
        for (key, value) in map {
            if self.pending.is_empty() {
                return;
            }
            let path = naming::join(prefix, key);

            match self.pending.iter().position(|r| r.regex().is_match(&path)) {
                Some(index) => {
                    let rule = self.pending.remove(index);
                    tracing::debug!(label = %rule.label(), path = %path, "Value label regex matched");
                    match stringify(value) {
                        Some(text) => self.extracted.push(ExtractedLabel {
                            label: rule.label().to_string(),
                            value: text,
                            path,
                        }),
                        None => tracing::debug!(
                            label = %rule.label(),
                            path = %path,
                            "Value label matched a non-scalar field"
                        ),
                    }
                }
                None => {
                    if let Value::Object(child) = value {
                        self.walk(&path, child);
                    }
                }
            }
        }
    }
}

/// Render a scalar field as a label value
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        format!("{:E}", n.as_f64().unwrap_or(f64::NAN))
    }
}
