//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions,
//! and exposes an on-demand snapshot of store occupancy.

use serde::Serialize;

// == Stat Counters ==
/// Running counters updated by the store as it serves traffic.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl StatCounters {
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Cache Stats ==
/// Point-in-time snapshot of the cache, computed by scanning all entries
/// against the current clock. Collecting it never mutates the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of entries physically present
    pub total: usize,
    /// Entries that have not yet expired
    pub active: usize,
    /// Entries past their expiry but not yet swept
    pub expired: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Number of registered subscriber callbacks
    pub subscribers: usize,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent or expired)
    pub misses: u64,
    /// Number of entries evicted at capacity
    pub evictions: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let requests = self.hits + self.misses;
        if requests == 0 {
            0.0
        } else {
            self.hits as f64 / requests as f64
        }
    }
}
