//! Sweep Task
//!
//! Background task that periodically evicts expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

// == Sweep Handle ==
/// Owner of a running sweep task.
///
/// The task keeps running until [`SweepHandle::cancel`] is called or the
/// handle is dropped.
#[derive(Debug)]
pub struct SweepHandle {
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Stops the task; a sweep in progress finishes its current pass under
    /// the lock before the task observes cancellation.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Cancels the task and waits until it has released the cache.
    pub async fn shutdown(mut self) {
        self.handle.abort();
        let _ = (&mut self.handle).await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a task that sweeps `cache` every `interval`.
///
/// The first sweep runs one interval after spawning. Each pass takes the
/// write lock for the duration of one `Cache::sweep` call.
///
/// # Example
/// ```ignore
/// let cache = Cache::create(CacheConfig::default(), None).into_shared();
/// let sweeper = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweeper.cancel();
/// ```
pub fn spawn_sweep_task(cache: SharedCache, interval: Duration) -> SweepHandle {
    let handle = tokio::spawn(async move {
        info!("Starting sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let report = {
                let mut cache_guard = cache.write().await;
                cache_guard.sweep()
            };

            if report.total() > 0 {
                info!(
                    "Sweep: removed {} memory, {} durable, {} corrupted entries",
                    report.memory_evicted, report.persistent_evicted, report.corrupted
                );
            } else {
                debug!("Sweep: no expired entries found");
            }
        }
    });

    SweepHandle { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, Lookup, ManualClock, MissReason};
    use crate::config::CacheConfig;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn shared_cache(store: &MemoryStore, clock: &ManualClock) -> SharedCache {
        Cache::create_with_clock(
            CacheConfig::default(),
            Some(Box::new(store.clone())),
            Arc::new(clock.clone()),
        )
        .into_shared()
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let cache = shared_cache(&store, &clock);

        cache
            .write()
            .await
            .set("expire_soon", json!("value"), Some(Duration::from_secs(1)));
        clock.advance(Duration::from_secs(5));

        let sweeper = spawn_sweep_task(cache.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(300)).await;

        // Gone from the durable tier without any read touching it
        assert!(store.is_empty());
        {
            let cache_guard = cache.read().await;
            assert_eq!(cache_guard.memory_len(), 0);
            assert!(cache_guard.stats().evictions >= 1);
        }

        sweeper.cancel();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let cache = shared_cache(&store, &clock);

        cache
            .write()
            .await
            .set("long_lived", json!(42), Some(Duration::from_secs(3600)));

        let sweeper = spawn_sweep_task(cache.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.write().await.get("long_lived").into_value(), Some(json!(42)));
        assert_eq!(store.len(), 1);

        sweeper.cancel();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_cancelled() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let cache = shared_cache(&store, &clock);

        let sweeper = spawn_sweep_task(cache.clone(), Duration::from_millis(20));
        sweeper.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(sweeper.is_finished(), "Task should be finished after cancel");

        // No further sweeps: an expired entry now waits for a read
        cache
            .write()
            .await
            .set("k", json!(1), Some(Duration::from_secs(1)));
        clock.advance(Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(cache.write().await.get("k"), Lookup::Miss(MissReason::Expired));
    }

    #[tokio::test]
    async fn test_shutdown_releases_cache() {
        let cache = shared_cache(&MemoryStore::new(), &ManualClock::default());

        let sweeper = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
        assert_eq!(Arc::strong_count(&cache), 2);

        sweeper.shutdown().await;
        assert_eq!(Arc::strong_count(&cache), 1);
    }
}
