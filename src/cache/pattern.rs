//! Key Pattern Module
//!
//! Explicit match shapes for bulk invalidation: an exact key, a resource
//! prefix, or a compiled regular expression.

use std::fmt;

use regex::Regex;

use crate::error::{CacheError, Result};

// == Key Pattern ==
/// A predicate over cache keys used by pattern-based invalidation.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    /// Matches one key exactly
    Exact(String),
    /// Matches every key starting with the prefix
    Prefix(String),
    /// Matches every key the expression matches
    Regex(Regex),
}

impl KeyPattern {
    // == Constructors ==
    /// Pattern matching a single key.
    pub fn exact(key: impl Into<String>) -> Self {
        Self::Exact(key.into())
    }

    /// Pattern matching every key under a prefix.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Compiles a string pattern into the regex variant.
    pub fn regex(pattern: &str) -> Result<Self> {
        let compiled = Regex::new(pattern).map_err(|source| CacheError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::Regex(compiled))
    }

    // == Matches ==
    /// Checks whether a key matches this pattern.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Exact(exact) => key == exact,
            Self::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Self::Regex(regex) => regex.is_match(key),
        }
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(exact) => write!(f, "exact:{}", exact),
            Self::Prefix(prefix) => write!(f, "prefix:{}", prefix),
            Self::Regex(regex) => write!(f, "regex:{}", regex.as_str()),
        }
    }
}
