//! Metric and label name construction
//!
//! One normalization policy applies to every name that reaches the registry,
//! whether it is a metric name or a label name: characters outside
//! `[A-Za-z0-9_]` become `_`, a leading digit gets a `_` prefix (label names
//! only, metric names always sit behind the namespace), and lowercasing is
//! applied when enabled. Label rules match against the raw path built from the
//! document's keys; the name filter sees the normalized metric name.

/// Separator between path segments
pub const SEPARATOR: char = '_';

/// Characters replaced by `_` in JMX `name` attributes
const JMX_ILLEGAL: [char; 6] = [' ', ',', ':', '-', '=', '.'];

/// Join a parent path and a child segment
///
/// The root has an empty path, so its children are the bare segment.
pub fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        let mut path = String::with_capacity(parent.len() + 1 + segment.len());
        path.push_str(parent);
        path.push(SEPARATOR);
        path.push_str(segment);
        path
    }
}

/// Clean a JMX bean `name` attribute so it can stand in for a path prefix
pub fn jmx_prefix(name: &str) -> String {
    name.chars()
        .map(|c| if JMX_ILLEGAL.contains(&c) { SEPARATOR } else { c })
        .collect()
}

/// Name normalization settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    lowercase: bool,
}

impl Normalizer {
    pub fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }

    /// Normalize a metric name (without namespace)
    pub fn metric_name(&self, raw: &str) -> String {
        self.sanitize(raw)
    }

    /// Normalize a label name
    pub fn label_name(&self, raw: &str) -> String {
        let name = self.sanitize(raw);
        match name.chars().next() {
            Some(c) if c.is_ascii_digit() => format!("_{name}"),
            None => "_".to_string(),
            _ => name,
        }
    }

    fn sanitize(&self, raw: &str) -> String {
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' {
                    if self.lowercase { c.to_ascii_lowercase() } else { c }
                } else {
                    SEPARATOR
                }
            })
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_at_root_is_bare_segment() {
        assert_eq!(join("", "indices"), "indices");
    }

    #[test]
    fn test_join_nested() {
        assert_eq!(join("indices_docs", "count"), "indices_docs_count");
        assert_eq!(join("d", "0"), "d_0");
    }

    #[test]
    fn test_jmx_prefix_replaces_illegal_characters() {
        assert_eq!(
            jmx_prefix("java.lang:type=Memory,name=Heap Usage"),
            "java_lang_type_Memory_name_Heap_Usage"
        );
    }

    #[test]
    fn test_metric_name_lowercases_and_sanitizes() {
        let n = Normalizer::new(true);
        assert_eq!(n.metric_name("JVM_Heap-Used.bytes"), "jvm_heap_used_bytes");
    }

    #[test]
    fn test_metric_name_preserves_case_when_disabled() {
        let n = Normalizer::new(false);
        assert_eq!(n.metric_name("JVM_Heap"), "JVM_Heap");
    }

    #[test]
    fn test_label_name_leading_digit() {
        let n = Normalizer::default();
        assert_eq!(n.label_name("0node"), "_0node");
        assert_eq!(n.label_name("Node-Name"), "node_name");
        assert_eq!(n.label_name(""), "_");
    }
}
