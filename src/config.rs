//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default TTL applied to entries stored without an explicit TTL
    pub default_ttl: Duration,
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// Background cleanup sweep interval
    pub cleanup_interval: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default entry TTL in milliseconds (default: 300000)
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 100)
    /// - `CLEANUP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 60000)
    pub fn from_env() -> Self {
        Self {
            default_ttl: env::var("DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(300_000)),
            max_size: env::var("MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            cleanup_interval: env::var("CLEANUP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(60_000)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_millis(300_000),
            max_size: 100,
            cleanup_interval: Duration::from_millis(60_000),
        }
    }
}
