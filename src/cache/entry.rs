//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and expiry metadata.
///
/// Timestamps are monotonic instants so tests can drive them with a paused
/// runtime clock. An entry whose `expires_at` has passed is logically
/// absent even while it is still physically present before a sweep.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub data: Value,
    /// Creation instant
    pub created_at: Instant,
    /// Expiration instant
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    pub fn new(data: Value, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is considered expired when the current
    /// time is greater than or equal to the expiration time, so a zero TTL
    /// produces an entry that is already logically absent.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining TTL, or zero if the entry has expired.
    #[allow(dead_code)]
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_entry_creation() {
        let entry = CacheEntry::new(json!("test_value"), Duration::from_secs(60));

        assert_eq!(entry.data, json!("test_value"));
        assert!(entry.expires_at > entry.created_at);
        assert!(!entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expiration() {
        let entry = CacheEntry::new(json!(1), Duration::from_secs(1));

        assert!(!entry.is_expired());

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert!(entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_remaining() {
        let entry = CacheEntry::new(json!(1), Duration::from_secs(10));

        assert_eq!(entry.ttl_remaining(), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(entry.ttl_remaining(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_remaining_expired() {
        let entry = CacheEntry::new(json!(1), Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiration_boundary_condition() {
        // Zero TTL expires exactly at creation time
        let entry = CacheEntry::new(json!("test"), Duration::ZERO);

        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }
}
