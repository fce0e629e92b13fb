//! Cached-Data Lifecycle Binding
//!
//! Orchestrates "check cache → return if fresh → else fetch → populate
//! cache → stay subscribed" for one call site. The binding observes its
//! key for its whole lifetime, so an invalidation triggered anywhere else
//! pushes the new value (or a reset) into local state with no explicit
//! wiring between readers. The subscription is released when the binding
//! is dropped.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheManager, Subscription};
use crate::error::{CacheError, Result};

/// Fetcher contract supplied by the service layer: an async operation
/// resolving with the target shape or an opaque error.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync>;

type ErrorCallback = Arc<dyn Fn(&CacheError) + Send + Sync>;

// == Query State ==
/// Lifecycle of one binding. `Ready` and `Error` re-enter `Loading` via
/// `refetch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Loading,
    Ready,
    Error,
}

// == Options ==
/// Configuration for a [`CachedQuery`].
pub struct CachedQueryOptions<T> {
    key: String,
    fetcher: Fetcher<T>,
    ttl: Option<Duration>,
    enabled: bool,
    on_error: Option<ErrorCallback>,
}

impl<T> CachedQueryOptions<T> {
    /// Binds a key to a fetcher. TTL defaults to the cache-wide default;
    /// the binding starts enabled.
    pub fn new<F, Fut>(key: impl Into<String>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self {
            key: key.into(),
            fetcher: Arc::new(move || Box::pin(fetch())),
            ttl: None,
            enabled: true,
            on_error: None,
        }
    }

    /// Overrides the entry TTL used when this binding populates the cache.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// A disabled binding never invokes its fetcher; it only mirrors
    /// whatever is (or becomes) cached under its key.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Side channel invoked with every fetch error, in addition to the
    /// error being stored locally and returned to the caller.
    pub fn on_error(mut self, callback: impl Fn(&CacheError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

struct QueryInner<T> {
    data: Option<T>,
    state: QueryState,
    error: Option<String>,
}

// == Cached Query ==
/// Read-through cached binding for one key.
pub struct CachedQuery<T> {
    cache: CacheManager,
    key: String,
    fetcher: Fetcher<T>,
    ttl: Option<Duration>,
    enabled: bool,
    on_error: Option<ErrorCallback>,
    state: Arc<Mutex<QueryInner<T>>>,
    _subscription: Subscription,
}

fn lock<T>(state: &Mutex<QueryInner<T>>) -> MutexGuard<'_, QueryInner<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> CachedQuery<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates the binding: seeds local state from whatever is cached and
    /// subscribes to the key so external mutations keep the state current.
    pub fn new(cache: &CacheManager, options: CachedQueryOptions<T>) -> Self {
        let CachedQueryOptions {
            key,
            fetcher,
            ttl,
            enabled,
            on_error,
        } = options;

        let state = Arc::new(Mutex::new(QueryInner {
            data: None,
            state: QueryState::Idle,
            error: None,
        }));

        if let Some(value) = cache.get(&key) {
            match serde_json::from_value::<T>(value) {
                Ok(data) => {
                    let mut inner = lock(&state);
                    inner.data = Some(data);
                    inner.state = QueryState::Ready;
                }
                Err(error) => {
                    warn!(key = %key, %error, "discarding cached value of unexpected shape")
                }
            }
        }

        let subscription = cache.subscribe(&key, {
            let state = Arc::clone(&state);
            let key = key.clone();
            move |value| {
                let mut inner = lock(&state);
                match value {
                    Some(value) => match serde_json::from_value::<T>(value.clone()) {
                        Ok(data) => {
                            inner.data = Some(data);
                            inner.state = QueryState::Ready;
                            inner.error = None;
                        }
                        Err(error) => {
                            warn!(key = %key, %error, "ignoring pushed value of unexpected shape")
                        }
                    },
                    None => {
                        inner.data = None;
                        inner.state = QueryState::Idle;
                    }
                }
            }
        });

        Self {
            cache: cache.clone(),
            key,
            fetcher,
            ttl,
            enabled,
            on_error,
            state,
            _subscription: subscription,
        }
    }

    // == Fetch ==
    /// Ensures data: a fresh cached value is returned without touching the
    /// fetcher; on a miss the fetcher runs, its result populates the cache,
    /// and the binding transitions to `Ready`. Errors are stored locally,
    /// forwarded to `on_error`, and returned.
    ///
    /// Disabled bindings return the current local data untouched.
    pub async fn fetch(&self) -> Result<Option<T>> {
        if !self.enabled {
            return Ok(self.data());
        }

        if let Some(value) = self.cache.get(&self.key) {
            match serde_json::from_value::<T>(value) {
                Ok(data) => {
                    let mut inner = lock(&self.state);
                    inner.data = Some(data.clone());
                    inner.state = QueryState::Ready;
                    inner.error = None;
                    return Ok(Some(data));
                }
                Err(error) => {
                    // a stale shape behaves like a miss and is re-fetched
                    warn!(key = %self.key, %error, "cached value of unexpected shape, refetching");
                    self.cache.invalidate(&self.key);
                }
            }
        }

        self.run_fetcher().await.map(Some)
    }

    // == Refetch ==
    /// Invalidates the key first, guaranteeing fresh data regardless of
    /// TTL, then runs the fetch path.
    pub async fn refetch(&self) -> Result<Option<T>> {
        if !self.enabled {
            return Ok(self.data());
        }
        self.cache.invalidate(&self.key);
        self.run_fetcher().await.map(Some)
    }

    // == Invalidate ==
    /// Removes the key from the cache and resets local state, without
    /// triggering a fetch. The reset arrives through the binding's own
    /// subscription before this call returns.
    pub fn invalidate(&self) {
        self.cache.invalidate(&self.key);
    }

    // == Accessors ==
    pub fn data(&self) -> Option<T> {
        lock(&self.state).data.clone()
    }

    pub fn state(&self) -> QueryState {
        lock(&self.state).state
    }

    pub fn is_loading(&self) -> bool {
        self.state() == QueryState::Loading
    }

    /// Rendered message of the last fetch error, cleared by the next
    /// successful fetch or pushed value.
    pub fn error(&self) -> Option<String> {
        lock(&self.state).error.clone()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    async fn run_fetcher(&self) -> Result<T> {
        {
            let mut inner = lock(&self.state);
            inner.state = QueryState::Loading;
            inner.error = None;
        }
        debug!(key = %self.key, "fetching");

        let data = match (self.fetcher)().await {
            Ok(data) => data,
            Err(source) => {
                return Err(self.fail(CacheError::Fetch {
                    key: self.key.clone(),
                    source,
                }))
            }
        };

        if let Err(error) = self.cache.set_as(&self.key, &data, self.ttl) {
            return Err(self.fail(error));
        }

        // the subscription already pushed the value; setting it again here
        // keeps local state authoritative even with no subscribers left
        let mut inner = lock(&self.state);
        inner.data = Some(data.clone());
        inner.state = QueryState::Ready;
        inner.error = None;
        Ok(data)
    }

    fn fail(&self, error: CacheError) -> CacheError {
        {
            let mut inner = lock(&self.state);
            inner.state = QueryState::Error;
            inner.error = Some(error.to_string());
        }
        if let Some(on_error) = &self.on_error {
            on_error(&error);
        }
        error
    }
}
