//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired cache entries. The
//! lazy expiry check on reads already guarantees correctness; the sweep
//! bounds memory growth from keys that are never re-read after expiry.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheManager;

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The returned handle is the task's lifecycle: abort it on shutdown (or
/// at the end of a test) to stop the sweep. The manager handle moved into
/// the task keeps observing the same shared store as every other clone.
///
/// # Example
/// ```ignore
/// let cache = CacheManager::new(CacheConfig::default());
/// let cleanup = spawn_cleanup_task(cache.clone(), config.cleanup_interval);
/// // Later, during shutdown:
/// cleanup.abort();
/// ```
pub fn spawn_cleanup_task(cache: CacheManager, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup();
            if removed > 0 {
                info!(removed, "TTL cleanup: removed expired entries");
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
