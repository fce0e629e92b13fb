//! Optimistic-Update Binding
//!
//! Applies a locally-computed next state immediately, runs the
//! authoritative async operation, then reconciles with the operation's
//! actual result or rolls back to the pre-update snapshot on failure.
//!
//! Overlapping updates on one binding are not serialized: each attempt
//! overwrites `previous` with the value current at that moment, so only
//! the most recent snapshot is retained. Callers needing a consistent
//! outcome across overlapping attempts must serialize them externally.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

// == Rolled Back ==
/// The operation failed and the bound value was restored to its pre-update
/// snapshot before this error was returned. Callers branch on the `Result`
/// instead of handling a panic or a stored error.
#[derive(Error, Debug)]
#[error("optimistic update rolled back: {source}")]
pub struct RolledBack {
    #[source]
    pub source: anyhow::Error,
}

struct OptimisticState<T> {
    current: T,
    previous: T,
    is_optimistic: bool,
}

// == Optimistic Value ==
/// A bound value that can be updated optimistically.
pub struct OptimisticValue<T> {
    inner: Arc<Mutex<OptimisticState<T>>>,
}

impl<T> Clone for OptimisticValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> OptimisticValue<T>
where
    T: Clone + Send + 'static,
{
    // == Constructor ==
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(OptimisticState {
                current: initial.clone(),
                previous: initial,
                is_optimistic: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OptimisticState<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Accessors ==
    pub fn data(&self) -> T {
        self.lock().current.clone()
    }

    pub fn is_optimistic(&self) -> bool {
        self.lock().is_optimistic
    }

    // == Update ==
    /// Snapshots the current value, applies `new_value` immediately, then
    /// runs `operation`. On success the bound value becomes the
    /// operation's actual result; the server result is authoritative and
    /// may differ from `new_value`. On failure the snapshot is restored
    /// and the error returned as [`RolledBack`].
    pub async fn update<F, Fut>(&self, new_value: T, operation: F) -> Result<T, RolledBack>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        {
            let mut state = self.lock();
            state.previous = state.current.clone();
            state.current = new_value;
            state.is_optimistic = true;
        }

        match operation().await {
            Ok(actual) => {
                let mut state = self.lock();
                state.current = actual.clone();
                state.is_optimistic = false;
                Ok(actual)
            }
            Err(source) => {
                self.rollback();
                Err(RolledBack { source })
            }
        }
    }

    // == Rollback ==
    /// Restores the most recent pre-update snapshot. Also exposed for
    /// manual use outside the automatic failure path.
    pub fn rollback(&self) {
        let mut state = self.lock();
        state.current = state.previous.clone();
        state.is_optimistic = false;
    }

    // == Set ==
    /// Plain, non-optimistic assignment: no snapshot is taken and the
    /// optimistic flag is left untouched.
    pub fn set(&self, value: T) {
        self.lock().current = value;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        value: i64,
    }

    fn row(value: i64) -> Row {
        Row {
            id: "1".into(),
            value,
        }
    }

    #[tokio::test]
    async fn test_update_success_reconciles_with_server_result() {
        let bound = OptimisticValue::new(row(0));
        let (release, gate) = oneshot::channel::<()>();

        let pending = tokio::spawn({
            let bound = bound.clone();
            async move {
                bound
                    .update(row(100), || async move {
                        gate.await.ok();
                        // the authoritative result differs from the guess
                        Ok(row(99))
                    })
                    .await
            }
        });

        // let the spawned update apply its optimistic value
        while !bound.is_optimistic() {
            tokio::task::yield_now().await;
        }
        assert_eq!(bound.data(), row(100));

        release.send(()).unwrap();
        let result = pending.await.unwrap().unwrap();

        assert_eq!(result, row(99));
        assert_eq!(bound.data(), row(99));
        assert!(!bound.is_optimistic());
    }

    #[tokio::test]
    async fn test_update_failure_rolls_back_exactly() {
        let bound = OptimisticValue::new(row(0));

        let result = bound
            .update(row(100), || async { Err(anyhow::anyhow!("rejected")) })
            .await;

        let err = result.unwrap_err();
        assert!(err.source.to_string().contains("rejected"));
        assert_eq!(bound.data(), row(0));
        assert!(!bound.is_optimistic());
    }

    #[tokio::test]
    async fn test_manual_rollback() {
        let bound = OptimisticValue::new(row(1));
        bound
            .update(row(2), || async { Ok(row(2)) })
            .await
            .unwrap();

        // previous still holds the pre-update snapshot
        bound.rollback();
        assert_eq!(bound.data(), row(1));
        assert!(!bound.is_optimistic());
    }

    #[tokio::test]
    async fn test_set_bypasses_snapshot_bookkeeping() {
        let bound = OptimisticValue::new(row(1));

        bound.set(row(5));
        assert_eq!(bound.data(), row(5));
        assert!(!bound.is_optimistic());

        // a later rollback restores the last real snapshot, not the set value
        bound
            .update(row(6), || async { Err(anyhow::anyhow!("no")) })
            .await
            .unwrap_err();
        assert_eq!(bound.data(), row(5));
    }

    #[tokio::test]
    async fn test_overlapping_updates_keep_last_snapshot() {
        let bound = OptimisticValue::new(row(0));
        let (release_first, first_gate) = oneshot::channel::<()>();

        let first = tokio::spawn({
            let bound = bound.clone();
            async move {
                bound
                    .update(row(10), || async move {
                        first_gate.await.ok();
                        Ok(row(11))
                    })
                    .await
            }
        });

        while !bound.is_optimistic() {
            tokio::task::yield_now().await;
        }

        // second attempt snapshots the first attempt's optimistic value
        bound
            .update(row(20), || async { Err(anyhow::anyhow!("no")) })
            .await
            .unwrap_err();
        assert_eq!(bound.data(), row(10));

        // the first attempt then reconciles with its own server result
        release_first.send(()).unwrap();
        first.await.unwrap().unwrap();
        assert_eq!(bound.data(), row(11));
    }
}
