//! View counts, trending list and watchlist
//!
//! Reads of collections go through the cache; mutations write to the
//! database and invalidate the cached views they affect.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::keys::{SAVED_MOVIES_KEY, SAVED_PREFIX, TRENDING_KEY};
use crate::cache::CacheService;
use crate::config::CacheTtl;
use crate::database::MovieDatabase;
use crate::error::DatabaseError;
use crate::models::{poster_url, Movie, SavedMovie, TrendingMovie};

/// Number of movies in the trending list
pub const TRENDING_LIMIT: usize = 5;

/// Database operations screens call, wired to the cache.
#[derive(Clone)]
pub struct MovieMetrics {
    db: Arc<dyn MovieDatabase>,
    cache: CacheService,
    ttl: CacheTtl,
}

impl MovieMetrics {
    pub fn new(db: Arc<dyn MovieDatabase>, cache: CacheService, ttl: CacheTtl) -> Self {
        Self { db, cache, ttl }
    }

    // == View Counts ==
    /// Records one view of `movie` and drops the cached trending list.
    ///
    /// Failures are logged and never reach the caller, so a broken
    /// database cannot block the details screen.
    pub async fn update_movie_view_count(&self, movie: &Movie) {
        match self.record_view(movie).await {
            Ok(count) => info!("Updated view count for: {} ({} views)", movie.title, count),
            Err(err) => {
                warn!("Error updating movie view count: {}", err);
                return;
            }
        }
        self.cache.remove_cached_data(TRENDING_KEY).await;
    }

    async fn record_view(&self, movie: &Movie) -> Result<u64, DatabaseError> {
        match self.db.find_metric(movie.id).await? {
            Some(existing) => {
                let count = existing.count + 1;
                self.db
                    .update_metric_count(&existing.document_id, count)
                    .await?;
                Ok(count)
            }
            None => {
                let metric = TrendingMovie {
                    document_id: String::new(),
                    movie_id: movie.id,
                    title: movie.title.clone(),
                    count: 1,
                    poster_url: poster_url(movie.poster_path.as_deref()),
                };
                self.db.create_metric(&metric).await?;
                Ok(1)
            }
        }
    }

    /// Views recorded for `movie_id`; 0 when unknown or unreachable.
    pub async fn get_movie_view_count(&self, movie_id: i64) -> u64 {
        match self.db.find_metric(movie_id).await {
            Ok(metric) => metric.map(|m| m.count).unwrap_or(0),
            Err(err) => {
                warn!("Error fetching movie view count: {}", err);
                0
            }
        }
    }

    // == Trending ==
    /// Most viewed movies, highest count first.
    pub async fn get_trending_movies(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<TrendingMovie>, DatabaseError> {
        let db = Arc::clone(&self.db);
        self.cache
            .fetch_with_cache(
                TRENDING_KEY,
                move || async move {
                    let top = db.top_metrics(TRENDING_LIMIT).await?;
                    debug!("Fetched {} trending movies from database", top.len());
                    Ok::<_, DatabaseError>(top)
                },
                self.ttl.trending,
                force_refresh,
            )
            .await
    }

    // == Watchlist ==
    /// Adds `movie` to the watchlist. Saving twice returns the existing entry.
    pub async fn save_movie(&self, movie: &Movie) -> Result<SavedMovie, DatabaseError> {
        if let Some(existing) = self.db.find_saved(movie.id).await? {
            return Ok(existing);
        }
        let saved = self.db.create_saved(&SavedMovie::from_movie(movie)).await?;
        info!("Saved movie: {}", movie.title);
        self.cache.clear_cache_by_prefix(SAVED_PREFIX).await;
        Ok(saved)
    }

    /// Removes `movie_id` from the watchlist. Returns whether it was saved.
    pub async fn unsave_movie(&self, movie_id: i64) -> Result<bool, DatabaseError> {
        let Some(existing) = self.db.find_saved(movie_id).await? else {
            return Ok(false);
        };
        self.db.delete_saved(&existing.document_id).await?;
        info!("Removed saved movie: {}", existing.title);
        self.cache.clear_cache_by_prefix(SAVED_PREFIX).await;
        Ok(true)
    }

    /// Whether `movie_id` is on the watchlist; false when unreachable.
    pub async fn is_movie_saved(&self, movie_id: i64) -> bool {
        match self.db.find_saved(movie_id).await {
            Ok(saved) => saved.is_some(),
            Err(err) => {
                warn!("Error checking saved movie: {}", err);
                false
            }
        }
    }

    /// The whole watchlist.
    pub async fn get_saved_movies(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<SavedMovie>, DatabaseError> {
        let db = Arc::clone(&self.db);
        self.cache
            .fetch_with_cache(
                SAVED_MOVIES_KEY,
                move || async move { db.list_saved().await },
                self.ttl.saved,
                force_refresh,
            )
            .await
    }
}
