//! Periodic Expiry Sweep
//!
//! Optional background task calling the store's sweep on a fixed interval.
//! The store already sweeps after every insert; this only adds a timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::ImageCacheStore;

/// Spawns a background task that sweeps expired images every interval.
///
/// Sweep failures are logged and the loop keeps going.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(store.clone(), 3600);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(store: Arc<ImageCacheStore>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "Starting periodic expiry sweep");

        loop {
            tokio::time::sleep(interval).await;

            if let Err(e) = store.sweep_expired().await {
                warn!(error = %e, "Periodic expiry sweep failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Backend, ImageRepository, ImageUpload, ManualClock, MemoryRepository, StoreOptions};

    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let repo = Arc::new(MemoryRepository::new());
        let store = Arc::new(
            ImageCacheStore::new(Backend::Custom(repo.clone()), StoreOptions::default())
                .with_clock(clock.clone()),
        );
        store.init().await.unwrap();

        store
            .cache(ImageUpload::new("old.png", "image/png", vec![1]))
            .await
            .unwrap();
        clock.advance_ms(DAY_MS);

        let handle = spawn_sweep_task(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(repo.list().await.unwrap().is_empty(), "expired entry should be swept");
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_live_entries() {
        let store = Arc::new(ImageCacheStore::new(Backend::Memory, StoreOptions::default()));
        store.init().await.unwrap();
        let id = store
            .cache(ImageUpload::new("live.png", "image/png", vec![1]))
            .await
            .unwrap();

        let handle = spawn_sweep_task(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(store.get(&id).await.unwrap().is_some());
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let store = Arc::new(ImageCacheStore::new(Backend::Memory, StoreOptions::default()));

        let handle = spawn_sweep_task(store, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
