//! Cached movie adapters
//!
//! Derive a cache key and TTL from each call and delegate to
//! [`CacheService::fetch_with_cache`] with the real API call as producer.

use std::sync::Arc;

use crate::cache::keys::{movie_details_key, popular_movies_key, search_results_key};
use crate::cache::CacheService;
use crate::config::CacheTtl;
use crate::error::ApiError;
use crate::models::{Movie, MovieDetails};
use crate::movies::MovieApi;

/// Movie API calls routed through the cache.
#[derive(Clone)]
pub struct CachedMovies {
    api: Arc<dyn MovieApi>,
    cache: CacheService,
    ttl: CacheTtl,
}

impl CachedMovies {
    pub fn new(api: Arc<dyn MovieApi>, cache: CacheService, ttl: CacheTtl) -> Self {
        Self { api, cache, ttl }
    }

    /// Popular listing page when `query` is blank, otherwise a search page.
    pub async fn fetch_movies_cached(
        &self,
        query: &str,
        page: u32,
        force_refresh: bool,
    ) -> Result<Vec<Movie>, ApiError> {
        let (key, ttl) = if query.trim().is_empty() {
            (popular_movies_key(page), self.ttl.popular)
        } else {
            (search_results_key(query, page), self.ttl.search)
        };

        let api = Arc::clone(&self.api);
        let query = query.to_string();
        self.cache
            .fetch_with_cache(
                &key,
                move || async move { api.fetch_movies(&query, page).await },
                ttl,
                force_refresh,
            )
            .await
    }

    pub async fn fetch_movie_details_cached(
        &self,
        movie_id: &str,
        force_refresh: bool,
    ) -> Result<MovieDetails, ApiError> {
        let api = Arc::clone(&self.api);
        let id = movie_id.to_string();
        self.cache
            .fetch_with_cache(
                &movie_details_key(movie_id),
                move || async move { api.fetch_movie_details(&id).await },
                self.ttl.details,
                force_refresh,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DurableStore, MemoryStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every call it receives.
    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MovieApi for RecordingApi {
        async fn fetch_movies(&self, query: &str, page: u32) -> Result<Vec<Movie>, ApiError> {
            self.calls.lock().unwrap().push(format!("movies:{query}:{page}"));
            Ok(vec![Movie::minimal(page as i64, query, None)])
        }

        async fn fetch_movie_details(&self, movie_id: &str) -> Result<MovieDetails, ApiError> {
            self.calls.lock().unwrap().push(format!("details:{movie_id}"));
            if movie_id == "missing" {
                return Err(ApiError::Status {
                    resource: "movie details".to_string(),
                    status: 404,
                });
            }
            Ok(MovieDetails {
                id: movie_id.parse().unwrap_or_default(),
                title: "X".to_string(),
                overview: String::new(),
                poster_path: None,
                backdrop_path: None,
                release_date: String::new(),
                vote_average: 0.0,
                runtime: 0,
                genres: Vec::new(),
            })
        }
    }

    fn adapters() -> (CachedMovies, Arc<RecordingApi>, Arc<MemoryStore>) {
        let api = Arc::new(RecordingApi::default());
        let store = Arc::new(MemoryStore::new());
        let movies = CachedMovies::new(
            api.clone(),
            CacheService::new(store.clone()),
            CacheTtl::default(),
        );
        (movies, api, store)
    }

    #[tokio::test]
    async fn test_popular_page_key() {
        let (movies, api, store) = adapters();

        movies.fetch_movies_cached("", 2, false).await.unwrap();
        movies.fetch_movies_cached("   ", 2, false).await.unwrap();

        assert_eq!(api.calls(), vec!["movies::2".to_string()]);
        assert_eq!(
            store.list_keys().await.unwrap(),
            vec!["movies_popular_page2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (movies, api, store) = adapters();

        let first = movies.fetch_movies_cached("Inception", 2, false).await.unwrap();
        let second = movies.fetch_movies_cached("inception", 2, false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.calls().len(), 1);
        assert_eq!(
            store.list_keys().await.unwrap(),
            vec!["search_results_inception_page2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_search_uses_search_ttl() {
        let (movies, _, store) = adapters();
        movies.fetch_movies_cached("Heat", 1, false).await.unwrap();

        let raw = store.get("search_results_heat_page1").await.unwrap().unwrap();
        let envelope: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let lifetime = envelope["expiresAt"].as_i64().unwrap() - envelope["createdAt"].as_i64().unwrap();

        assert_eq!(lifetime, CacheTtl::default().search.as_millis() as i64);
    }

    #[tokio::test]
    async fn test_details_cached_and_refreshable() {
        let (movies, api, _) = adapters();

        movies.fetch_movie_details_cached("42", false).await.unwrap();
        movies.fetch_movie_details_cached("42", false).await.unwrap();
        movies.fetch_movie_details_cached("42", true).await.unwrap();

        assert_eq!(api.calls(), vec!["details:42".to_string(), "details:42".to_string()]);
    }

    #[tokio::test]
    async fn test_details_error_propagates() {
        let (movies, _, store) = adapters();

        let err = movies.fetch_movie_details_cached("missing", false).await.unwrap_err();

        assert!(matches!(err, ApiError::Status { status: 404, .. }));
        assert!(store.is_empty().await);
    }
}
