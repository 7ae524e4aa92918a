//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache primitives and orchestrator against
//! arbitrary keys, payloads and lifetimes.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_test::block_on;

use crate::cache::keys::search_results_key;
use crate::cache::{CacheService, DurableStore, ManualClock, MemoryStore};

// == Test Configuration ==
const START_MS: i64 = 1_700_000_000_000;

fn service() -> (CacheService, Arc<MemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(START_MS));
    let service = CacheService::new(store.clone()).with_clock(clock.clone());
    (service, store, clock)
}

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}"
}

/// Generates small JSON-like payloads
fn payload_strategy() -> impl Strategy<Value = HashMap<String, Vec<i64>>> {
    prop::collection::hash_map("[a-z]{1,8}", prop::collection::vec(any::<i64>(), 0..5), 0..5)
}

/// Generates TTLs from one millisecond to one day
fn ttl_strategy() -> impl Strategy<Value = Duration> {
    (1u64..86_400_000).prop_map(Duration::from_millis)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // A payload written with any positive TTL reads back unchanged right away.
    #[test]
    fn prop_set_then_get_returns_payload(
        key in key_strategy(),
        payload in payload_strategy(),
        ttl in ttl_strategy()
    ) {
        let (service, _, _) = service();
        let read = block_on(async {
            service.set_cached_data(&key, &payload, ttl).await;
            service.get_cached_data::<HashMap<String, Vec<i64>>>(&key).await
        });
        prop_assert_eq!(read, Some(payload));
    }

    // Once the clock passes createdAt + ttl the entry reads as absent and is
    // gone from the store.
    #[test]
    fn prop_expired_entry_is_absent_and_purged(
        key in key_strategy(),
        payload in payload_strategy(),
        ttl in ttl_strategy(),
        overshoot in 1i64..1_000_000
    ) {
        let (service, store, clock) = service();
        let (read, keys) = block_on(async {
            service.set_cached_data(&key, &payload, ttl).await;
            clock.set(START_MS + ttl.as_millis() as i64 + overshoot);
            let read = service.get_cached_data::<HashMap<String, Vec<i64>>>(&key).await;
            (read, store.list_keys().await.unwrap())
        });
        prop_assert!(read.is_none());
        prop_assert!(!keys.contains(&key));
    }

    // Inside the TTL window a second fetch is answered from cache.
    #[test]
    fn prop_hit_inside_window_calls_producer_once(
        key in key_strategy(),
        value in any::<i64>(),
        ttl in ttl_strategy(),
        elapsed_fraction in 0.0f64..=1.0
    ) {
        let (service, _, clock) = service();
        let calls = Arc::new(AtomicUsize::new(0));
        let make = |calls: &Arc<AtomicUsize>| {
            let calls = Arc::clone(calls);
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<i64, String>(value)
            }
        };

        let (first, second) = block_on(async {
            let first = service.fetch_with_cache(&key, make(&calls), ttl, false).await;
            let elapsed = (ttl.as_millis() as f64 * elapsed_fraction) as i64;
            clock.set(START_MS + elapsed);
            let second = service.fetch_with_cache(&key, make(&calls), ttl, false).await;
            (first, second)
        });

        prop_assert_eq!(first, Ok(value));
        prop_assert_eq!(second, Ok(value));
        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // Forced refresh calls the producer even over a fresh entry.
    #[test]
    fn prop_force_refresh_bypasses_cache(
        key in key_strategy(),
        cached in any::<i64>(),
        fresh in any::<i64>()
    ) {
        let (service, _, _) = service();
        let ttl = Duration::from_secs(3600);
        let result = block_on(async {
            service.set_cached_data(&key, &cached, ttl).await;
            service
                .fetch_with_cache(&key, move || async move { Ok::<i64, String>(fresh) }, ttl, true)
                .await
        });
        prop_assert_eq!(result, Ok(fresh));
    }

    // Search keys fold case but keep page numbers apart.
    #[test]
    fn prop_search_key_is_case_insensitive(query in "[a-zA-Z ]{1,32}", page in 1u32..1000) {
        prop_assert_eq!(
            search_results_key(&query.to_uppercase(), page),
            search_results_key(&query.to_lowercase(), page)
        );
        prop_assert_ne!(
            search_results_key(&query, page),
            search_results_key(&query, page + 1)
        );
    }

    // Prefix invalidation removes exactly the matching keys.
    #[test]
    fn prop_prefix_clear_removes_exactly_matching(
        keys in prop::collection::hash_set(key_strategy(), 0..30),
        prefix in "[a-z_]{1,4}"
    ) {
        let (service, store, _) = service();
        let remaining: HashSet<String> = block_on(async {
            for key in &keys {
                service.set_cached_data(key, &1u8, Duration::from_secs(60)).await;
            }
            service.clear_cache_by_prefix(&prefix).await;
            store.list_keys().await.unwrap().into_iter().collect()
        });

        let expected: HashSet<String> =
            keys.into_iter().filter(|k| !k.starts_with(&prefix)).collect();
        prop_assert_eq!(remaining, expected);
    }

    // Removing keys that were never written leaves the store untouched.
    #[test]
    fn prop_remove_absent_is_noop(
        present in prop::collection::hash_set(key_strategy(), 0..10),
        absent in key_strategy()
    ) {
        prop_assume!(!present.contains(&absent));
        let (service, store, _) = service();
        let remaining: HashSet<String> = block_on(async {
            for key in &present {
                service.set_cached_data(key, &0u8, Duration::from_secs(60)).await;
            }
            service.remove_cached_data(&absent).await;
            service.remove_cached_data(&absent).await;
            store.list_keys().await.unwrap().into_iter().collect()
        });
        prop_assert_eq!(remaining, present);
    }
}
