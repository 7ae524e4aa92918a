//! Expiry Sweep Task
//!
//! Background task that periodically deletes expired cache entries, bounding
//! store growth from entries that are written but never read again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheService;

/// Spawns a background task that sweeps expired entries every
/// `interval_secs` seconds.
///
/// Reads still expire entries lazily; the sweep only catches entries that
/// nobody reads. Abort the returned handle to stop it.
///
/// # Example
/// ```ignore
/// let cache = CacheService::new(Arc::new(MemoryStore::new()));
/// let sweep_handle = spawn_sweep_task(cache.clone(), 60);
/// // Later, during teardown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: CacheService, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cache sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired().await;
            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    })
}
