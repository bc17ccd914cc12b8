//! Key Pattern Module
//!
//! Matchers over canonical key text used for bulk invalidation.

use regex::Regex;

use super::key::escape_target;
use crate::error::Result;

// == Key Pattern ==
/// Selects cache keys by their canonical text.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    /// Key contains this text anywhere
    Substring(String),
    /// Key matches this regular expression
    Regex(Regex),
}

impl KeyPattern {
    /// Matches keys containing `text`.
    pub fn substring(text: impl Into<String>) -> Self {
        KeyPattern::Substring(text.into())
    }

    /// Matches keys against a regular expression.
    ///
    /// # Errors
    /// `InvalidPattern` if the expression does not compile.
    pub fn regex(expr: &str) -> Result<Self> {
        Ok(KeyPattern::Regex(Regex::new(expr)?))
    }

    /// Matches every key whose target starts with `prefix`.
    ///
    /// The prefix is escaped exactly as targets are inside keys.
    pub fn target_prefix(prefix: &str) -> Result<Self> {
        Self::regex(&format!("^{}", regex::escape(&escape_target(prefix))))
    }

    /// Returns true if `key` is selected by this pattern.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Substring(text) => key.contains(text.as_str()),
            KeyPattern::Regex(re) => re.is_match(key),
        }
    }
}

impl From<&str> for KeyPattern {
    fn from(text: &str) -> Self {
        KeyPattern::substring(text)
    }
}

impl From<Regex> for KeyPattern {
    fn from(re: Regex) -> Self {
        KeyPattern::Regex(re)
    }
}
