//! Movie Cache - client-side cache layer for a movie browsing app
//!
//! Provides a TTL key-value cache over durable string storage, with
//! single-flight fetch-or-populate, per-query cache keys and prefix
//! invalidation, plus the movie API and document database adapters that
//! sit on top of it.

pub mod cache;
pub mod config;
pub mod database;
pub mod debug;
pub mod error;
pub mod models;
pub mod movies;
pub mod state;
pub mod tasks;

pub use cache::CacheService;
pub use config::{CacheTtl, Config};
pub use state::AppState;
pub use tasks::spawn_sweep_task;
