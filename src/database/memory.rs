//! In-process document database

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::MovieDatabase;
use crate::error::DatabaseError;
use crate::models::{SavedMovie, TrendingMovie};

/// Document database kept in memory, for tests and offline use.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    next_id: AtomicU64,
    metrics: RwLock<Vec<TrendingMovie>>,
    saved: RwLock<Vec<SavedMovie>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn unique_id(&self) -> String {
        format!("doc{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl MovieDatabase for MemoryDatabase {
    async fn find_metric(&self, movie_id: i64) -> Result<Option<TrendingMovie>, DatabaseError> {
        let metrics = self.metrics.read().await;
        Ok(metrics.iter().find(|m| m.movie_id == movie_id).cloned())
    }

    async fn create_metric(&self, metric: &TrendingMovie) -> Result<TrendingMovie, DatabaseError> {
        let stored = TrendingMovie {
            document_id: self.unique_id(),
            ..metric.clone()
        };
        self.metrics.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn update_metric_count(
        &self,
        document_id: &str,
        count: u64,
    ) -> Result<(), DatabaseError> {
        let mut metrics = self.metrics.write().await;
        let metric = metrics
            .iter_mut()
            .find(|m| m.document_id == document_id)
            .ok_or_else(|| DatabaseError::Status {
                status: 404,
                message: format!("Document {document_id} not found"),
            })?;
        metric.count = count;
        Ok(())
    }

    async fn top_metrics(&self, limit: usize) -> Result<Vec<TrendingMovie>, DatabaseError> {
        let mut metrics = self.metrics.read().await.clone();
        metrics.sort_by(|a, b| b.count.cmp(&a.count));
        metrics.truncate(limit);
        Ok(metrics)
    }

    async fn find_saved(&self, movie_id: i64) -> Result<Option<SavedMovie>, DatabaseError> {
        let saved = self.saved.read().await;
        Ok(saved.iter().find(|s| s.movie_id == movie_id).cloned())
    }

    async fn create_saved(&self, movie: &SavedMovie) -> Result<SavedMovie, DatabaseError> {
        let stored = SavedMovie {
            document_id: self.unique_id(),
            ..movie.clone()
        };
        self.saved.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn delete_saved(&self, document_id: &str) -> Result<(), DatabaseError> {
        self.saved
            .write()
            .await
            .retain(|s| s.document_id != document_id);
        Ok(())
    }

    async fn list_saved(&self) -> Result<Vec<SavedMovie>, DatabaseError> {
        Ok(self.saved.read().await.clone())
    }
}
