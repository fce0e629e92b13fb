//! Viewcache - an in-process cache for server-derived view state
//!
//! Provides a cache manager with TTL expiry, pattern-based invalidation,
//! and change subscriptions; a table of invalidation strategies encoding
//! the dependency graph between resources; and two binding helpers
//! (read-through cached queries, optimistic updates with rollback) that
//! give call sites consistent, low-latency views of server state without
//! over-fetching or showing stale data after mutations.

pub mod cache;
pub mod config;
pub mod error;
pub mod hooks;
pub mod strategies;
pub mod tasks;

pub use cache::{CacheManager, CacheStats, KeyPattern, Subscription};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use hooks::{CachedQuery, CachedQueryOptions, OptimisticValue, QueryState};
pub use strategies::InvalidationStrategies;
pub use tasks::spawn_cleanup_task;
