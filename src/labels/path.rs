//! Labels carved out of the metric path
//!
//! Each rule's regex is tested against the in-progress path at every node.
//! On a match the first capture group becomes the label value and the whole
//! match is cut out of the path. Rules run in configuration order, each one
//! against the path as left by the previous rule.

use super::LabelRule;

/// Applies path-label rules to a node's path
#[derive(Debug, Clone, Default)]
pub struct PathLabeler {
    rules: Vec<LabelRule>,
}

/// Result of applying path-label rules to one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// Working metric path with matched segments removed
    pub path: String,
    /// `(label, value)` pairs in the order they matched
    pub labels: Vec<(String, String)>,
}

impl PathLabeler {
    pub fn new(rules: Vec<LabelRule>) -> Self {
        Self { rules }
    }

    pub fn apply(&self, path: String) -> PathMatch {
        let mut path = path;
        let mut labels = Vec::new();

        for rule in &self.rules {
            let Some(captures) = rule.regex().captures(&path) else {
                continue;
            };
            let Some(value) = captures.get(1) else {
                continue;
            };
            let value = value.as_str().to_string();
            let matched = captures[0].to_string();

            path = path.replace(&matched, "");
            if path.is_empty() {
                path = rule.label().to_string();
            }

            tracing::trace!(
                label = %rule.label(),
                value = %value,
                path = %path,
                "Path label matched"
            );
            labels.push((rule.label().to_string(), value));
        }

        PathMatch { path, labels }
    }
}
