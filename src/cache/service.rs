//! Cache Service Module
//!
//! Cache primitives over a durable store: read with lazy expiry, best-effort
//! writes, targeted and prefix invalidation, and inventory.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{de::DeserializeOwned, de::IgnoredAny, Serialize};
use tracing::{debug, info, warn};

use crate::cache::entry;
use crate::cache::fetch::InFlight;
use crate::cache::{CacheCounters, CacheEnvelope, CacheStats, Clock, DurableStore, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Service ==
/// Handle on the cache layer.
///
/// Cloning is cheap and every clone shares the same store, clock, counters
/// and in-flight fetches.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    counters: Arc<Mutex<CacheCounters>>,
    pub(crate) in_flight: Arc<InFlight>,
    pub(crate) coalesce: bool,
}

impl CacheService {
    // == Constructor ==
    /// Creates a service over `store` using the wall clock, with
    /// single-flight fetching enabled.
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            counters: Arc::new(Mutex::new(CacheCounters::new())),
            in_flight: Arc::new(InFlight::default()),
            coalesce: true,
        }
    }

    /// Creates a service configured from `config`.
    pub fn from_config(store: Arc<dyn DurableStore>, config: &Config) -> Self {
        Self::new(store).with_coalescing(config.coalesce_requests)
    }

    /// Replaces the clock used for envelope timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Enables or disables sharing one producer call between concurrent misses.
    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce = enabled;
        self
    }

    /// The underlying durable store.
    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// Current instant according to the service clock.
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Snapshot of lookup counters.
    pub fn counters(&self) -> CacheCounters {
        self.counters
            .lock()
            .map(|counters| counters.clone())
            .unwrap_or_default()
    }

    fn record(&self, update: impl FnOnce(&mut CacheCounters)) {
        if let Ok(mut counters) = self.counters.lock() {
            update(&mut counters);
        }
    }

    // == Get ==
    /// Returns the payload stored under `key` if present and not expired.
    ///
    /// Expired envelopes are deleted on the way out. Storage or decode
    /// failures read as a miss.
    pub async fn get_cached_data<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_envelope(key).await.map(|envelope| envelope.data)
    }

    /// Like [`get_cached_data`](Self::get_cached_data) but keeps the envelope
    /// timestamps.
    pub async fn get_envelope<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEnvelope<T>> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache MISS for key: {}", key);
                self.record(CacheCounters::record_miss);
                return None;
            }
            Err(err) => {
                warn!("Error reading cache for key {}: {}", key, err);
                self.record(CacheCounters::record_miss);
                return None;
            }
        };

        let envelope = match CacheEnvelope::<T>::decode(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("Unreadable cache entry for key {}: {}", key, err);
                if matches!(err, CacheError::SchemaMismatch { .. }) {
                    self.discard(key).await;
                }
                self.record(CacheCounters::record_miss);
                return None;
            }
        };

        if envelope.is_expired(self.now_ms()) {
            debug!("Cache EXPIRED for key: {}", key);
            self.discard(key).await;
            self.record(CacheCounters::record_expired);
            return None;
        }

        debug!("Cache HIT for key: {}", key);
        self.record(CacheCounters::record_hit);
        Some(envelope)
    }

    async fn discard(&self, key: &str) {
        if let Err(err) = self.store.remove(key).await {
            warn!("Failed to drop stale cache entry {}: {}", key, err);
        }
    }

    // == Set ==
    /// Writes `data` under `key` for `ttl`, replacing any existing entry.
    ///
    /// Never fails: a rejected write is logged and the entry is simply not
    /// cached.
    pub async fn set_cached_data<T: Serialize + ?Sized>(&self, key: &str, data: &T, ttl: Duration) {
        let result = self.try_set(key, data, ttl).await;
        self.record(|counters| counters.record_write(result.is_ok()));
        match result {
            Ok(()) => debug!("Cached data for key: {} (expires in {}s)", key, ttl.as_secs()),
            Err(err) => warn!("Error setting cache for key {}: {}", key, err),
        }
    }

    async fn try_set<T: Serialize + ?Sized>(&self, key: &str, data: &T, ttl: Duration) -> Result<()> {
        let raw = entry::encode(data, self.now_ms(), ttl)?;
        self.store.set(key, raw).await
    }

    // == Remove ==
    /// Deletes one entry. Absent keys are a no-op.
    ///
    /// A fetch for `key` that is still pending will not write its result.
    pub async fn remove_cached_data(&self, key: &str) {
        self.in_flight.forget(key);
        match self.store.remove(key).await {
            Ok(()) => debug!("Removed cache for key: {}", key),
            Err(err) => warn!("Error removing cache for key {}: {}", key, err),
        }
    }

    // == Clear By Prefix ==
    /// Deletes every entry whose key starts with `prefix`.
    ///
    /// Pending fetches for matching keys will not write their results.
    /// Returns how many keys were removed; 0 when the store fails.
    pub async fn clear_cache_by_prefix(&self, prefix: &str) -> usize {
        self.in_flight.forget_prefix(prefix);
        let keys = match self.store.list_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                warn!("Error listing cache keys for prefix {}: {}", prefix, err);
                return 0;
            }
        };

        let matching: Vec<String> = keys.into_iter().filter(|k| k.starts_with(prefix)).collect();
        if matching.is_empty() {
            return 0;
        }

        match self.store.remove_all(&matching).await {
            Ok(()) => {
                info!("Cleared {} cache entries with prefix: {}", matching.len(), prefix);
                matching.len()
            }
            Err(err) => {
                warn!("Error clearing cache with prefix {}: {}", prefix, err);
                0
            }
        }
    }

    // == Clear All ==
    /// Wipes the whole durable store, including keys the cache did not write.
    pub async fn clear_all_cache(&self) {
        self.in_flight.forget_all();
        match self.store.clear().await {
            Ok(()) => info!("Cleared all cache"),
            Err(err) => warn!("Error clearing all cache: {}", err),
        }
    }

    // == Stats ==
    /// Lists every stored key and sums the stored value sizes.
    ///
    /// Reads each value once; intended for diagnostics.
    pub async fn get_cache_stats(&self) -> CacheStats {
        let keys = match self.store.list_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                warn!("Error getting cache stats: {}", err);
                return CacheStats::default();
            }
        };

        let mut total_size_bytes = 0;
        for key in &keys {
            if let Ok(Some(value)) = self.store.get(key).await {
                total_size_bytes += value.len();
            }
        }

        let stats = CacheStats {
            count: keys.len(),
            total_size_bytes,
            keys,
        };
        debug!(
            "Cache stats: {} keys, {:.2} KB",
            stats.count,
            stats.total_size_kb()
        );
        stats
    }

    // == Sweep Expired ==
    /// Deletes every expired or foreign-schema envelope in the store.
    ///
    /// Values that are not envelopes at all are left alone. Returns the
    /// number of entries removed.
    pub async fn sweep_expired(&self) -> usize {
        let keys = match self.store.list_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                warn!("Error listing cache keys for sweep: {}", err);
                return 0;
            }
        };

        let now = self.now_ms();
        let mut stale = Vec::new();
        for key in keys {
            let Ok(Some(raw)) = self.store.get(&key).await else {
                continue;
            };
            match CacheEnvelope::<IgnoredAny>::decode(&raw) {
                Ok(envelope) if envelope.is_expired(now) => stale.push(key),
                Err(CacheError::SchemaMismatch { .. }) => stale.push(key),
                _ => {}
            }
        }

        if stale.is_empty() {
            return 0;
        }
        match self.store.remove_all(&stale).await {
            Ok(()) => stale.len(),
            Err(err) => {
                warn!("Error removing expired cache entries: {}", err);
                0
            }
        }
    }
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("coalesce", &self.coalesce)
            .field("counters", &self.counters())
            .finish_non_exhaustive()
    }
}
