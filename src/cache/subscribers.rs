//! Subscription Registry Module
//!
//! Per-key listener sets notified on every mutation of that key.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Callback invoked with the key's new value, or `None` when the key is
/// invalidated or cleared.
pub type SubscriberFn = dyn Fn(Option<&Value>) + Send + Sync;

// == Subscriber Registry ==
/// Tracks which callbacks observe which keys.
///
/// A key with zero subscribers is removed from the registry, so no callback
/// is retained after its last unsubscribe.
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    /// Listener lists per key, in subscription order
    listeners: HashMap<String, Vec<(u64, Arc<SubscriberFn>)>>,
    /// Next subscriber id
    next_id: u64,
}

impl SubscriberRegistry {
    // == Constructor ==
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // == Add ==
    /// Registers a callback for a key and returns its id.
    pub(crate) fn add(&mut self, key: &str, callback: Arc<SubscriberFn>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners
            .entry(key.to_string())
            .or_default()
            .push((id, callback));
        id
    }

    // == Remove ==
    /// Removes one callback by id. Removing an unknown id is a no-op, so
    /// unsubscribe stays idempotent.
    pub(crate) fn remove(&mut self, key: &str, id: u64) {
        if let Some(listeners) = self.listeners.get_mut(key) {
            listeners.retain(|(listener_id, _)| *listener_id != id);
            if listeners.is_empty() {
                self.listeners.remove(key);
            }
        }
    }

    // == Callbacks For ==
    /// Returns the callbacks registered for a key, in subscription order.
    pub(crate) fn callbacks_for(&self, key: &str) -> Vec<Arc<SubscriberFn>> {
        self.listeners
            .get(key)
            .map(|listeners| listeners.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }

    // == Subscribed Keys ==
    /// Returns every key that currently has at least one subscriber.
    pub(crate) fn subscribed_keys(&self) -> Vec<String> {
        self.listeners.keys().cloned().collect()
    }

    // == Counts ==
    /// Total number of registered callbacks across all keys.
    pub(crate) fn total_subscribers(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
