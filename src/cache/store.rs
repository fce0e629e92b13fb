//! Cache Store Module
//!
//! The store engine combining HashMap storage with TTL expiration,
//! capacity eviction by insertion time, and the subscriber registry.
//!
//! Mutating methods return the subscriber notifications they produced
//! instead of invoking them; the manager dispatches after releasing its
//! lock so a callback may call back into the cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::entry::CacheEntry;
use crate::cache::pattern::KeyPattern;
use crate::cache::stats::{CacheStats, StatCounters};
use crate::cache::subscribers::{SubscriberFn, SubscriberRegistry};
use crate::config::CacheConfig;

// == Notification ==
/// One subscriber callback and the payload it must receive.
pub(crate) struct Notification {
    pub(crate) callback: Arc<SubscriberFn>,
    pub(crate) payload: Option<Value>,
}

impl Notification {
    fn for_key(
        subscribers: &SubscriberRegistry,
        key: &str,
        payload: Option<&Value>,
    ) -> Vec<Notification> {
        subscribers
            .callbacks_for(key)
            .into_iter()
            .map(|callback| Notification {
                callback,
                payload: payload.cloned(),
            })
            .collect()
    }
}

// == Cache Store ==
/// Cache storage with TTL expiry and oldest-first capacity eviction.
pub(crate) struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Per-key listener sets
    subscribers: SubscriberRegistry,
    /// Hit/miss/eviction counters
    counters: StatCounters,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL applied when a set carries none
    default_ttl: Duration,
}

impl CacheStore {
    // == Constructor ==
    pub(crate) fn new(config: &CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            subscribers: SubscriberRegistry::new(),
            counters: StatCounters::default(),
            max_size: config.max_size,
            default_ttl: config.default_ttl,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` if the key is absent or expired. An expired entry is
    /// deleted as a side effect of being read; the deletion is silent
    /// (subscribers hear about set, invalidate, and clear only).
    pub(crate) fn get(&mut self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.counters.record_miss();
                None
            }
            Some(entry) => {
                self.counters.record_hit();
                Some(entry.data.clone())
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a value with optional TTL.
    ///
    /// If the key already exists the entry is overwritten and its TTL
    /// reset. If the key is new and the store is at capacity, the entry
    /// with the oldest `created_at` is evicted first. Subscribers of the
    /// key are always notified with the new value.
    pub(crate) fn set(
        &mut self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Vec<Notification> {
        let is_overwrite = self.entries.contains_key(key);
        if !is_overwrite && self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl));
        let pending = Notification::for_key(&self.subscribers, key, Some(&entry.data));
        self.entries.insert(key.to_string(), entry);
        pending
    }

    // == Invalidate ==
    /// Deletes the entry if present and notifies subscribers of the key
    /// with `None` regardless, so notification-driven clearing always sees
    /// the invalidation.
    pub(crate) fn invalidate(&mut self, key: &str) -> Vec<Notification> {
        self.entries.remove(key);
        Notification::for_key(&self.subscribers, key, None)
    }

    // == Invalidate Matching ==
    /// Deletes every key matching the pattern, notifying each key's
    /// subscribers individually.
    pub(crate) fn invalidate_matching(&mut self, pattern: &KeyPattern) -> Vec<Notification> {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        debug!(pattern = %pattern, removed = matching.len(), "pattern invalidation");

        let mut pending = Vec::new();
        for key in matching {
            self.entries.remove(&key);
            pending.extend(Notification::for_key(&self.subscribers, &key, None));
        }
        pending
    }

    // == Clear ==
    /// Empties the store and notifies every currently-subscribed key.
    pub(crate) fn clear(&mut self) -> Vec<Notification> {
        self.entries.clear();
        let mut pending = Vec::new();
        for key in self.subscribers.subscribed_keys() {
            pending.extend(Notification::for_key(&self.subscribers, &key, None));
        }
        pending
    }

    // == Subscribe ==
    pub(crate) fn subscribe(&mut self, key: &str, callback: Arc<SubscriberFn>) -> u64 {
        self.subscribers.add(key, callback)
    }

    pub(crate) fn unsubscribe(&mut self, key: &str, id: u64) {
        self.subscribers.remove(key, id);
    }

    // == Stats ==
    /// Computes an occupancy snapshot by scanning all entries against the
    /// current clock. Expired entries are counted, not deleted.
    pub(crate) fn stats(&self) -> CacheStats {
        let expired = self
            .entries
            .values()
            .filter(|entry| entry.is_expired())
            .count();
        CacheStats {
            total: self.entries.len(),
            active: self.entries.len() - expired,
            expired,
            max_size: self.max_size,
            subscribers: self.subscribers.total_subscribers(),
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, bounding memory growth from keys that
    /// are never re-read. Returns the number of entries removed.
    pub(crate) fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.entries.remove(&key);
        }
        count
    }

    // == Length ==
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Evict Oldest ==
    /// Evicts the entry with the oldest `created_at`. A full scan is
    /// acceptable at the configured capacities; access order never factors
    /// in.
    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.created_at)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            debug!(key = %key, "evicting oldest entry at capacity");
            self.entries.remove(&key);
            self.counters.record_eviction();
        }
    }
}
