//! Blacklist/whitelist filtering of emitted metric names

use crate::error::{AppError, AppResult};
use regex::Regex;

/// Decides whether a metric name is exported
///
/// The blacklist wins over the whitelist when both match. With neither
/// configured every name passes.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    blacklist: Option<Regex>,
    whitelist: Option<Regex>,
}

impl NameFilter {
    /// Compile a filter from optional patterns
    ///
    /// Empty patterns are treated as unset.
    pub fn from_patterns(blacklist: Option<&str>, whitelist: Option<&str>) -> AppResult<Self> {
        Ok(Self {
            blacklist: compile("blacklist", blacklist)?,
            whitelist: compile("whitelist", whitelist)?,
        })
    }

    pub fn allow(&self, name: &str) -> bool {
        if let Some(blacklist) = &self.blacklist
            && blacklist.is_match(name)
        {
            return false;
        }
        match &self.whitelist {
            Some(whitelist) => whitelist.is_match(name),
            None => true,
        }
    }
}

fn compile(field: &str, pattern: Option<&str>) -> AppResult<Option<Regex>> {
    match pattern {
        Some(p) if !p.is_empty() => Regex::new(p)
            .map(Some)
            .map_err(|source| AppError::InvalidRegex {
                field: field.to_string(),
                pattern: p.to_string(),
                source,
            }),
        _ => Ok(None),
    }
}
