//! Integration Tests for the cache layer
//!
//! Drives the public API end to end: adapters, orchestrator and stores.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use movie_cache::cache::{DurableStore, FileStore, ManualClock, MemoryStore};
use movie_cache::database::{MemoryDatabase, MovieMetrics};
use movie_cache::error::ApiError;
use movie_cache::models::{Movie, MovieDetails};
use movie_cache::movies::{CachedMovies, MovieApi};
use movie_cache::{debug, AppState, CacheService, CacheTtl, Config};

// == Helper Functions ==

/// Movie API that counts calls and answers slowly.
#[derive(Default)]
struct CountingApi {
    calls: AtomicUsize,
}

impl CountingApi {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MovieApi for CountingApi {
    async fn fetch_movies(&self, query: &str, page: u32) -> Result<Vec<Movie>, ApiError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as i64;
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(vec![Movie::minimal(call, format!("{query}:{page}"), None)])
    }

    async fn fetch_movie_details(&self, movie_id: &str) -> Result<MovieDetails, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(MovieDetails {
            id: movie_id.parse().unwrap_or_default(),
            title: format!("Movie {movie_id}"),
            overview: String::new(),
            poster_path: Some(format!("/{movie_id}.jpg")),
            backdrop_path: None,
            release_date: "2001-01-01".to_string(),
            vote_average: 7.0,
            runtime: 100,
            genres: Vec::new(),
        })
    }
}

struct Harness {
    clock: Arc<ManualClock>,
    api: Arc<CountingApi>,
    store: Arc<MemoryStore>,
    cache: CacheService,
    movies: CachedMovies,
    metrics: MovieMetrics,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let api = Arc::new(CountingApi::default());
    let store = Arc::new(MemoryStore::new());
    let cache = CacheService::new(store.clone()).with_clock(clock.clone());
    let ttl = CacheTtl::default();
    Harness {
        movies: CachedMovies::new(api.clone(), cache.clone(), ttl),
        metrics: MovieMetrics::new(Arc::new(MemoryDatabase::new()), cache.clone(), ttl),
        clock,
        api,
        store,
        cache,
    }
}

// == Expiry ==

#[tokio::test]
async fn test_listing_expires_after_ttl() {
    let h = harness();
    let ttl = CacheTtl::default().popular;

    let first = h.movies.fetch_movies_cached("", 1, false).await.unwrap();
    h.clock.advance(ttl);
    let still_cached = h.movies.fetch_movies_cached("", 1, false).await.unwrap();
    assert_eq!(first, still_cached);
    assert_eq!(h.api.calls(), 1);

    h.clock.advance(Duration::from_millis(1));
    let refetched = h.movies.fetch_movies_cached("", 1, false).await.unwrap();
    assert_ne!(first, refetched);
    assert_eq!(h.api.calls(), 2);
}

#[tokio::test]
async fn test_sweep_removes_only_expired() {
    let h = harness();
    h.movies.fetch_movies_cached("heat", 1, false).await.unwrap();
    h.movies.fetch_movie_details_cached("42", false).await.unwrap();

    // Past the search TTL, inside the details TTL.
    h.clock.advance(CacheTtl::default().search + Duration::from_secs(1));

    assert_eq!(h.cache.sweep_expired().await, 1);
    assert_eq!(
        h.store.list_keys().await.unwrap(),
        vec!["movie_details_42".to_string()]
    );
}

// == Single-flight ==

#[tokio::test]
async fn test_concurrent_searches_share_one_call() {
    let h = harness();

    let (a, b, c) = tokio::join!(
        h.movies.fetch_movies_cached("Matrix", 1, false),
        h.movies.fetch_movies_cached("matrix", 1, false),
        h.movies.fetch_movies_cached("MATRIX", 1, false),
    );

    assert_eq!(h.api.calls(), 1);
    assert_eq!(a.unwrap(), b.unwrap());
    assert!(c.is_ok());
}

// == Invalidation ==

#[tokio::test]
async fn test_view_invalidates_trending_but_not_listings() {
    let h = harness();
    h.movies.fetch_movies_cached("", 1, false).await.unwrap();
    let details = h.movies.fetch_movie_details_cached("7", false).await.unwrap();

    assert!(h.metrics.get_trending_movies(false).await.unwrap().is_empty());

    h.metrics.update_movie_view_count(&Movie::from(&details)).await;

    let trending = h.metrics.get_trending_movies(false).await.unwrap();
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].movie_id, 7);
    assert!(h.store.get("movies_popular_page1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_clear_movie_cache_then_refetch() {
    let h = harness();
    h.movies.fetch_movies_cached("", 1, false).await.unwrap();
    h.movies.fetch_movie_details_cached("1", false).await.unwrap();
    h.metrics.get_trending_movies(false).await.unwrap();

    assert_eq!(debug::clear_movie_cache(&h.cache).await, 2);
    assert_eq!(
        h.store.list_keys().await.unwrap(),
        vec!["trending_movies".to_string()]
    );

    h.movies.fetch_movies_cached("", 1, false).await.unwrap();
    assert_eq!(h.api.calls(), 3);
}

// == Persistence ==

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let api = Arc::new(CountingApi::default());

    {
        let store = Arc::new(FileStore::open(&path).await.unwrap());
        let movies = CachedMovies::new(api.clone(), CacheService::new(store), CacheTtl::default());
        movies.fetch_movie_details_cached("9", false).await.unwrap();
    }

    let store = Arc::new(FileStore::open(&path).await.unwrap());
    let movies = CachedMovies::new(api.clone(), CacheService::new(store), CacheTtl::default());
    let details = movies.fetch_movie_details_cached("9", false).await.unwrap();

    assert_eq!(details.title, "Movie 9");
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn test_app_state_wiring() {
    let config = Config {
        sweep_interval: 60,
        ..Config::default()
    };
    let api = Arc::new(CountingApi::default());
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        api.clone(),
        Arc::new(MemoryDatabase::new()),
        &config,
    );

    state.movies.fetch_movies_cached("", 1, false).await.unwrap();
    state.movies.fetch_movies_cached("", 1, true).await.unwrap();

    assert_eq!(api.calls(), 2);
    assert_eq!(state.cache.get_cache_stats().await.count, 1);
    state.shutdown();
}
