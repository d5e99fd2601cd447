//! Tag selection by regular expression

use regex::Regex;
use tracing::warn;

/// Compiled set of tag patterns
///
/// A tag is selected when any pattern finds a match anywhere in it
/// (unanchored search). Patterns that fail to compile are logged and skipped.
#[derive(Debug, Clone, Default)]
pub struct TagPatterns {
    patterns: Vec<Regex>,
}

impl TagPatterns {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| {
                Regex::new(p.as_ref())
                    .inspect_err(|e| warn!("Skipping invalid tag pattern {:?}: {}", p.as_ref(), e))
                    .ok()
            })
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(tag))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Tags selected by at least one pattern, in input order
    pub fn select<'a>(&self, tags: &'a [String]) -> Vec<&'a String> {
        tags.iter().filter(|t| self.matches(t)).collect()
    }
}
