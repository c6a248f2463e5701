//! Label rules and the active label stack
//!
//! Static labels sit at the bottom of the stack for the process lifetime,
//! value labels are appended once at startup, and path labels are pushed and
//! popped as the walker enters and leaves subtrees. Every push made while
//! walking goes through a [`LabelScope`], which truncates the stack back to
//! its entry depth when dropped.

use crate::config::LabelRuleConfig;
use crate::error::{AppError, AppResult};
use regex::Regex;
use std::ops::{Deref, DerefMut};

pub mod path;
pub mod value;

pub use path::PathLabeler;
pub use value::{ExtractedLabel, ValueLabelExtractor};

/// A compiled `label:regex` rule
#[derive(Debug, Clone)]
pub struct LabelRule {
    label: String,
    regex: Regex,
}

impl LabelRule {
    pub fn new(label: impl Into<String>, regex: Regex) -> Self {
        Self {
            label: label.into(),
            regex,
        }
    }

    /// Compile a configured rule
    ///
    /// `field` names the configuration section for error messages.
    pub fn compile(rule: &LabelRuleConfig, field: &str) -> AppResult<Self> {
        let regex = Regex::new(&rule.regex).map_err(|source| AppError::InvalidRegex {
            field: format!("{field} label '{}'", rule.label),
            pattern: rule.regex.clone(),
            source,
        })?;
        Ok(Self::new(rule.label.clone(), regex))
    }

    /// Compile a list of configured rules, preserving order
    pub fn compile_all(rules: &[LabelRuleConfig], field: &str) -> AppResult<Vec<Self>> {
        rules.iter().map(|r| Self::compile(r, field)).collect()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Parallel label names and values
///
/// `names.len() == values.len()` holds after every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelStack {
    names: Vec<String>,
    values: Vec<String>,
}

impl LabelStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from ordered name/value pairs
    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut stack = Self::new();
        for (name, value) in pairs {
            stack.push(name, value);
        }
        stack
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.names.push(name.into());
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Look up the value of a label by name (innermost wins)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .rposition(|n| n == name)
            .map(|i| self.values[i].as_str())
    }

    /// Open a scope; labels pushed through it are removed when it drops
    pub fn scope(&mut self) -> LabelScope<'_> {
        let depth = self.len();
        LabelScope { stack: self, depth }
    }

    fn truncate(&mut self, depth: usize) {
        self.names.truncate(depth);
        self.values.truncate(depth);
    }
}

/// Guard restoring a [`LabelStack`] to the depth it had when opened
pub struct LabelScope<'a> {
    stack: &'a mut LabelStack,
    depth: usize,
}

impl LabelScope<'_> {
    /// Number of labels pushed since the scope was opened
    pub fn pushed(&self) -> usize {
        self.stack.len() - self.depth
    }
}

impl Deref for LabelScope<'_> {
    type Target = LabelStack;

    fn deref(&self) -> &LabelStack {
        self.stack
    }
}

impl DerefMut for LabelScope<'_> {
    fn deref_mut(&mut self) -> &mut LabelStack {
        self.stack
    }
}

impl Drop for LabelScope<'_> {
    fn drop(&mut self) {
        self.stack.truncate(self.depth);
    }
}
