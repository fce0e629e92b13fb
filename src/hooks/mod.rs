//! Binding Helpers
//!
//! Per-call-site state machines built on the cache manager: read-through
//! cached queries and optimistic updates with rollback.

mod cached;
mod optimistic;

pub use cached::{CachedQuery, CachedQueryOptions, Fetcher, QueryState};
pub use optimistic::{OptimisticValue, RolledBack};
