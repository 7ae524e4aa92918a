//! Application State
//!
//! Explicitly constructed handles on the cache and its collaborators, with
//! an init/teardown lifecycle.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{CacheService, DurableStore, FileStore, MemoryStore};
use crate::config::Config;
use crate::database::{AppwriteDatabase, MovieDatabase, MovieMetrics};
use crate::error::Result;
use crate::movies::{CachedMovies, MovieApi, WatchModeClient};
use crate::tasks::spawn_sweep_task;

/// Everything a screen needs to load data.
///
/// Cloning is cheap; clones share one cache.
#[derive(Clone)]
pub struct AppState {
    /// Cache primitives and orchestrator
    pub cache: CacheService,
    /// Cached movie API adapters
    pub movies: CachedMovies,
    /// View counts, trending list and watchlist
    pub metrics: MovieMetrics,
    sweep: Option<Arc<JoinHandle<()>>>,
}

impl AppState {
    /// Wires the given collaborators together.
    ///
    /// Starts the expiry sweep when `config.sweep_interval` is non-zero,
    /// which requires a running tokio runtime.
    pub fn new(
        store: Arc<dyn DurableStore>,
        api: Arc<dyn MovieApi>,
        db: Arc<dyn MovieDatabase>,
        config: &Config,
    ) -> Self {
        let cache = CacheService::from_config(store, config);
        let ttl = config.ttl();
        let sweep = (config.sweep_interval > 0)
            .then(|| Arc::new(spawn_sweep_task(cache.clone(), config.sweep_interval)));

        Self {
            movies: CachedMovies::new(api, cache.clone(), ttl),
            metrics: MovieMetrics::new(db, cache.clone(), ttl),
            cache,
            sweep,
        }
    }

    /// Builds the production state: file store, WatchMode and Appwrite.
    ///
    /// Falls back to an in-memory store when no cache file location is known.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn DurableStore> = match &config.cache_file {
            Some(path) => {
                info!("Using cache file {}", path.display());
                Arc::new(FileStore::open(path).await?)
            }
            None => {
                info!("No cache directory available, caching in memory");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::new(
            store,
            Arc::new(WatchModeClient::from_config(config)),
            Arc::new(AppwriteDatabase::from_config(config)),
            config,
        ))
    }

    /// Stops background work. Pending fetches still finish.
    pub fn shutdown(&self) {
        if let Some(handle) = &self.sweep {
            handle.abort();
            info!("Cache sweep task stopped");
        }
    }
}
