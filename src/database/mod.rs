//! Document Database Module
//!
//! Hosted document database holding per-movie view counts and the saved
//! watchlist, plus the cache-aware operations screens call on it.

mod appwrite;
mod memory;
mod metrics;

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::models::{SavedMovie, TrendingMovie};

pub use appwrite::AppwriteDatabase;
pub use memory::MemoryDatabase;
pub use metrics::{MovieMetrics, TRENDING_LIMIT};

/// Document operations the app needs from the hosted database.
#[async_trait]
pub trait MovieDatabase: Send + Sync {
    /// View-count document for `movie_id`, if one exists.
    async fn find_metric(&self, movie_id: i64) -> Result<Option<TrendingMovie>, DatabaseError>;

    /// Stores a new view-count document and returns it with its id.
    async fn create_metric(&self, metric: &TrendingMovie) -> Result<TrendingMovie, DatabaseError>;

    /// Sets the view count of an existing document.
    async fn update_metric_count(&self, document_id: &str, count: u64)
        -> Result<(), DatabaseError>;

    /// Up to `limit` view-count documents, highest count first.
    async fn top_metrics(&self, limit: usize) -> Result<Vec<TrendingMovie>, DatabaseError>;

    /// Watchlist entry for `movie_id`, if saved.
    async fn find_saved(&self, movie_id: i64) -> Result<Option<SavedMovie>, DatabaseError>;

    /// Adds a watchlist entry and returns it with its id.
    async fn create_saved(&self, movie: &SavedMovie) -> Result<SavedMovie, DatabaseError>;

    /// Removes a watchlist entry.
    async fn delete_saved(&self, document_id: &str) -> Result<(), DatabaseError>;

    /// Every watchlist entry.
    async fn list_saved(&self) -> Result<Vec<SavedMovie>, DatabaseError>;
}
