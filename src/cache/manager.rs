//! Cache Manager Module
//!
//! Public, clonable facade over the store engine. Mutations collect their
//! subscriber notifications under the store lock and dispatch them after
//! the lock is released, in call order, so a callback may call back into
//! the manager without deadlocking.
//!
//! Values are stored as JSON; `get_as`/`set_as` round-trip typed payloads
//! through serde. Returned values are clones of the stored data; mutating
//! a returned value never changes the cache, callers store a modified copy
//! explicitly.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cache::pattern::KeyPattern;
use crate::cache::stats::CacheStats;
use crate::cache::store::{CacheStore, Notification};
use crate::cache::subscribers::SubscriberFn;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache Manager ==
/// Shared handle to one cache instance.
///
/// Cheap to clone; all clones observe the same store. The embedding
/// application owns the process-wide instance and injects it wherever
/// bindings and strategies need it.
#[derive(Clone)]
pub struct CacheManager {
    inner: Arc<Mutex<CacheStore>>,
}

impl CacheManager {
    // == Constructor ==
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheStore::new(&config))),
        }
    }

    /// Locks the store. Subscriber callbacks run outside the lock, so a
    /// poisoned mutex only means a panic inside the engine itself; the map
    /// is still structurally sound, recover the guard.
    fn store(&self) -> MutexGuard<'_, CacheStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(pending: Vec<Notification>) {
        for notification in pending {
            (notification.callback)(notification.payload.as_ref());
        }
    }

    // == Get ==
    /// Returns the cached value for a key, or `None` if absent or expired.
    /// An expired entry is removed as a side effect of the read.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store().get(key)
    }

    /// Typed read: deserializes the cached value into `T`.
    ///
    /// A miss is `Ok(None)`; a cached value of the wrong shape is a
    /// `Decode` error, never silently absorbed.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| CacheError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    // == Set ==
    /// Stores a value, evicting the oldest entry first if a new key
    /// arrives at capacity, then notifies subscribers of the key.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let pending = self.store().set(key, value, ttl);
        Self::dispatch(pending);
    }

    /// Typed write: serializes `value` and stores it.
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let encoded = serde_json::to_value(value).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, encoded, ttl);
        Ok(())
    }

    // == Invalidate ==
    /// Deletes the entry and notifies subscribers of the key with `None`,
    /// whether or not an entry existed.
    pub fn invalidate(&self, key: &str) {
        let pending = self.store().invalidate(key);
        Self::dispatch(pending);
    }

    /// Deletes every key matching the pattern, notifying each key's
    /// subscribers individually.
    pub fn invalidate_matching(&self, pattern: &KeyPattern) {
        let pending = self.store().invalidate_matching(pattern);
        Self::dispatch(pending);
    }

    /// String form of pattern invalidation; the pattern is compiled to a
    /// regular expression.
    pub fn invalidate_pattern(&self, pattern: &str) -> Result<()> {
        let compiled = KeyPattern::regex(pattern)?;
        self.invalidate_matching(&compiled);
        Ok(())
    }

    /// Invalidates every key namespaced under a resource prefix.
    pub fn invalidate_resource(&self, resource: &str) {
        self.invalidate_matching(&KeyPattern::prefix(resource));
    }

    // == Clear ==
    /// Empties the store and notifies every currently-subscribed key with
    /// `None`.
    pub fn clear(&self) {
        let pending = self.store().clear();
        Self::dispatch(pending);
    }

    // == Subscribe ==
    /// Registers a callback for a key. The returned guard removes exactly
    /// that callback, explicitly via `unsubscribe` or on drop.
    pub fn subscribe(
        &self,
        key: &str,
        callback: impl Fn(Option<&Value>) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.store().subscribe(key, Arc::new(callback));
        Subscription {
            store: Arc::downgrade(&self.inner),
            key: key.to_string(),
            id: Some(id),
        }
    }

    // == Stats ==
    /// Point-in-time snapshot; collecting it never evicts or sweeps.
    pub fn stats(&self) -> CacheStats {
        self.store().stats()
    }

    // == Cleanup ==
    /// Proactive sweep of expired entries. Returns the number removed.
    pub fn cleanup(&self) -> usize {
        self.store().cleanup_expired()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Subscription ==
/// Scoped subscription handle.
///
/// Dropping the guard releases the subscription, so no callback outlives
/// its owning binding. `unsubscribe` is idempotent: calls after the first
/// are no-ops.
pub struct Subscription {
    store: Weak<Mutex<CacheStore>>,
    key: String,
    id: Option<u64>,
}

impl Subscription {
    /// The key this subscription observes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Removes the callback from the registry.
    pub fn unsubscribe(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(store) = self.store.upgrade() {
                store
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .unsubscribe(&self.key, id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Client {
        id: String,
        name: String,
    }

    fn manager() -> CacheManager {
        CacheManager::new(CacheConfig::default())
    }

    #[test]
    fn test_typed_roundtrip() {
        let cache = manager();
        let client = Client {
            id: "c1".into(),
            name: "Acme".into(),
        };

        cache.set_as("clients:c1", &client, None).unwrap();
        let loaded: Option<Client> = cache.get_as("clients:c1").unwrap();

        assert_eq!(loaded, Some(client));
    }

    #[test]
    fn test_typed_miss_is_none_not_error() {
        let cache = manager();
        let loaded: Option<Client> = cache.get_as("clients:absent").unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_typed_shape_mismatch_is_decode_error() {
        let cache = manager();
        cache.set("clients:c1", json!("not a client"), None);

        let result: Result<Option<Client>> = cache.get_as("clients:c1");
        assert!(matches!(result, Err(CacheError::Decode { .. })));
    }

    #[test]
    fn test_subscription_drop_releases() {
        let cache = manager();
        let count = Arc::new(AtomicUsize::new(0));

        {
            let cb_count = Arc::clone(&count);
            let _sub = cache.subscribe("k", move |_| {
                cb_count.fetch_add(1, Ordering::SeqCst);
            });
            cache.set("k", json!(1), None);
        }

        // the guard is gone; this mutation must not reach the callback
        cache.set("k", json!(2), None);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().subscribers, 0);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let cache = manager();
        let count = Arc::new(AtomicUsize::new(0));
        let cb_count = Arc::clone(&count);

        let mut sub = cache.subscribe("k", move |_| {
            cb_count.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();
        sub.unsubscribe();

        cache.set("k", json!(1), None);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_may_reenter_the_manager() {
        let cache = manager();
        let reentrant = cache.clone();
        let seen = Arc::new(Mutex::new(None));
        let cb_seen = Arc::clone(&seen);

        let _sub = cache.subscribe("a", move |_| {
            // runs after the store lock is released
            *cb_seen.lock().unwrap() = reentrant.get("b");
        });

        cache.set("b", json!("other"), None);
        cache.set("a", json!(1), None);

        assert_eq!(*seen.lock().unwrap(), Some(json!("other")));
    }

    #[test]
    fn test_invalidate_pattern_string_form() {
        let cache = manager();
        cache.set("projects:1", json!(1), None);
        cache.set("leads:1", json!(2), None);

        cache.invalidate_pattern("^projects").unwrap();

        assert_eq!(cache.get("projects:1"), None);
        assert_eq!(cache.get("leads:1"), Some(json!(2)));
    }

    #[test]
    fn test_invalidate_pattern_rejects_bad_regex() {
        let cache = manager();
        assert!(cache.invalidate_pattern("(unclosed").is_err());
    }

    #[test]
    fn test_invalidate_resource_prefix_sugar() {
        let cache = manager();
        cache.set("reports:q1", json!(1), None);
        cache.set("reports:q2", json!(2), None);
        cache.set("clients:1", json!(3), None);

        cache.invalidate_resource("reports");

        assert_eq!(cache.len(), 1);
        assert!(cache.get("clients:1").is_some());
    }

    #[test]
    fn test_clones_share_the_store() {
        let cache = manager();
        let other = cache.clone();

        cache.set("k", json!(1), None);
        assert_eq!(other.get("k"), Some(json!(1)));
    }
}
