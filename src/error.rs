//! Error types for the view cache
//!
//! Provides unified error handling using thiserror.
//!
//! A cache miss is not an error: absent and expired keys surface as `None`
//! from the read path. Errors cover fetcher failures and serde round-trips
//! of typed values through the store.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the view cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A fetcher supplied to a cached binding failed
    #[error("fetch for key '{key}' failed: {source}")]
    Fetch {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A typed value could not be serialized for storage
    #[error("failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A cached value did not match the requested type
    #[error("cached value for key '{key}' does not match the requested type: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A string key pattern failed to compile
    #[error("invalid key pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// == Result Type Alias ==
/// Convenience Result type for the view cache.
pub type Result<T> = std::result::Result<T, CacheError>;
