//! Fetch-With-Cache Module
//!
//! Returns a valid cached payload or runs the producer and repopulates the
//! cache. Concurrent misses on one key share a single producer call.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::CacheService;

type SharedFetch<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct Flight {
    id: u64,
    task: Box<dyn Any + Send + Sync>,
}

// == In-Flight Fetches ==
/// Pending producer calls keyed by cache key.
#[derive(Default)]
pub(crate) struct InFlight {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<String, Flight>>,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Flight>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Forgets the flight for `key` if it is still the one numbered `id`.
    fn finish(&self, key: &str, id: u64) {
        let mut tasks = self.lock();
        if tasks.get(key).is_some_and(|flight| flight.id == id) {
            tasks.remove(key);
        }
    }

    /// Whether the flight numbered `id` still owns `key`.
    fn is_current(&self, key: &str, id: u64) -> bool {
        self.lock().get(key).is_some_and(|flight| flight.id == id)
    }

    /// Detaches the pending fetch for `key`. Its result still reaches the
    /// callers already waiting on it but is no longer written to the cache.
    pub(crate) fn forget(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Detaches every pending fetch whose key starts with `prefix`.
    pub(crate) fn forget_prefix(&self, prefix: &str) {
        self.lock().retain(|key, _| !key.starts_with(prefix));
    }

    /// Detaches every pending fetch.
    pub(crate) fn forget_all(&self) {
        self.lock().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

impl CacheService {
    // == Fetch With Cache ==
    /// Returns the cached payload for `key`, or calls `producer` and caches
    /// its result for `ttl`.
    ///
    /// With `force_refresh` the cache read is skipped and `producer` is
    /// always called. Producer errors are returned unchanged and nothing is
    /// written. A failed cache write does not fail the call.
    ///
    /// When coalescing is on, callers that miss while a fetch for the same
    /// key is pending wait for that fetch instead of starting another. A
    /// forced call replaces the pending fetch, and an invalidation of the
    /// key detaches it; a replaced or detached fetch does not write its
    /// result. The pending fetch runs on the tokio runtime until it
    /// completes, even if every caller stops waiting.
    pub async fn fetch_with_cache<T, E, F, Fut>(
        &self,
        key: &str,
        producer: F,
        ttl: Duration,
        force_refresh: bool,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if !force_refresh {
            if let Some(cached) = self.get_cached_data::<T>(key).await {
                return Ok(cached);
            }
        }

        let producer = if self.coalesce {
            match self.join_or_start(key, producer, ttl, force_refresh) {
                Ok(task) => return task.await,
                Err(producer) => producer,
            }
        } else {
            producer
        };

        debug!("Fetching fresh data for: {}", key);
        let fresh = producer().await?;
        self.set_cached_data(key, &fresh, ttl).await;
        Ok(fresh)
    }

    /// Joins the pending fetch for `key` or registers a new one.
    ///
    /// A forced call never joins; its fetch takes over the key. Hands the
    /// producer back when a pending fetch for the key yields a different
    /// payload type, so the caller can run it uncoalesced.
    fn join_or_start<T, E, F, Fut>(
        &self,
        key: &str,
        producer: F,
        ttl: Duration,
        force_refresh: bool,
    ) -> Result<SharedFetch<T, E>, F>
    where
        T: Serialize + Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let mut tasks = self.in_flight.lock();

        if let Some(flight) = tasks.get(key).filter(|_| !force_refresh) {
            return match flight.task.downcast_ref::<SharedFetch<T, E>>() {
                Some(task) => {
                    debug!("Joining in-flight fetch for: {}", key);
                    Ok(task.clone())
                }
                None => {
                    warn!("In-flight fetch for {} has another payload type", key);
                    Err(producer)
                }
            };
        }

        let id = self.in_flight.next_id.fetch_add(1, Ordering::Relaxed);
        let service = self.clone();
        let owned_key = key.to_string();
        let task = async move {
            debug!("Fetching fresh data for: {}", owned_key);
            let outcome = AssertUnwindSafe(async move { producer().await })
                .catch_unwind()
                .await;
            let result = match outcome {
                Ok(result) => result,
                Err(payload) => {
                    service.in_flight.finish(&owned_key, id);
                    panic::resume_unwind(payload);
                }
            };

            if let Ok(fresh) = &result {
                if service.in_flight.is_current(&owned_key, id) {
                    service.set_cached_data(&owned_key, fresh, ttl).await;
                } else {
                    debug!("Dropping superseded fetch result for: {}", owned_key);
                }
            }
            // Unregister before any waiter sees the result, so a caller that
            // starts after this one completes gets a fetch of its own.
            service.in_flight.finish(&owned_key, id);
            result
        }
        .boxed()
        .shared();

        if tasks
            .insert(
                key.to_string(),
                Flight {
                    id,
                    task: Box::new(task.clone()),
                },
            )
            .is_some()
        {
            debug!("Forced fetch replaces in-flight fetch for: {}", key);
        }
        drop(tasks);

        tokio::spawn(task.clone());
        Ok(task)
    }
}
