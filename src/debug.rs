//! Cache Debug Utilities
//!
//! Helpers to inspect and reset the cache during development.

use serde_json::Value;
use tracing::info;

use crate::cache::keys::{MOVIES_PREFIX, MOVIE_DETAILS_PREFIX, SEARCH_RESULTS_PREFIX, TRENDING_KEY};
use crate::cache::{CacheEnvelope, CacheService, CacheStats};

/// Logs store inventory and lookup counters, and returns the inventory.
pub async fn debug_cache(cache: &CacheService) -> CacheStats {
    let stats = cache.get_cache_stats().await;
    let counters = cache.counters();

    info!("Total cached items: {}", stats.count);
    info!("Total cache size: {:.2} KB", stats.total_size_kb());
    info!(
        "Lookups: {} hits, {} misses ({} expired), hit rate {:.0}%",
        counters.hits,
        counters.misses,
        counters.expired,
        counters.hit_rate() * 100.0
    );
    for key in &stats.keys {
        info!("  - {}", key);
    }
    stats
}

/// Drops every listing, search and details entry. Returns how many went.
pub async fn clear_movie_cache(cache: &CacheService) -> usize {
    let mut removed = 0;
    for prefix in [MOVIES_PREFIX, MOVIE_DETAILS_PREFIX, SEARCH_RESULTS_PREFIX] {
        removed += cache.clear_cache_by_prefix(prefix).await;
    }
    info!("Movie caches cleared ({} entries)", removed);
    removed
}

/// Drops the trending list.
pub async fn clear_trending_cache(cache: &CacheService) -> usize {
    let removed = cache.clear_cache_by_prefix(TRENDING_KEY).await;
    info!("Trending cache cleared");
    removed
}

/// Returns the envelope under `key` as JSON if present and unexpired,
/// logging its payload.
pub async fn inspect_cache(cache: &CacheService, key: &str) -> Option<CacheEnvelope<Value>> {
    let envelope = cache.get_envelope::<Value>(key).await;
    match &envelope {
        Some(found) => {
            let now = cache.now_ms();
            info!(
                "Cache entry {} found (age {}s, expires in {}s):",
                key,
                found.age_ms(now) / 1000,
                found.ttl_remaining_ms(now) / 1000
            );
            let pretty = serde_json::to_string_pretty(&found.data).unwrap_or_default();
            info!("{}", pretty);
        }
        None => info!("Cache entry {} not found or expired", key),
    }
    envelope
}

/// Wipes the entire store.
pub async fn reset_cache(cache: &CacheService) {
    info!("Resetting entire cache");
    cache.clear_all_cache().await;
}
