//! Configuration Module
//!
//! Handles loading cache, API and database settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

/// Default WatchMode REST endpoint
pub const DEFAULT_WATCHMODE_BASE_URL: &str = "https://api.watchmode.com/v1";

/// Default Appwrite endpoint
pub const DEFAULT_APPWRITE_ENDPOINT: &str = "https://nyc.cloud.appwrite.io/v1";

/// Application configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds for the popular listing pages
    pub ttl_popular: u64,
    /// TTL in seconds for search result pages
    pub ttl_search: u64,
    /// TTL in seconds for movie details
    pub ttl_details: u64,
    /// TTL in seconds for the trending list
    pub ttl_trending: u64,
    /// TTL in seconds for the saved-movies list
    pub ttl_saved: u64,
    /// Share one producer call between concurrent misses on the same key
    pub coalesce_requests: bool,
    /// Periodic expiry sweep interval in seconds, 0 disables the sweep
    pub sweep_interval: u64,
    /// Location of the file-backed durable store
    pub cache_file: Option<PathBuf>,
    /// WatchMode API base URL
    pub watchmode_base_url: String,
    /// WatchMode API key
    pub watchmode_api_key: String,
    /// Appwrite endpoint
    pub appwrite_endpoint: String,
    /// Appwrite project id
    pub appwrite_project_id: String,
    /// Appwrite database id
    pub appwrite_database_id: String,
    /// Collection holding per-movie view counts
    pub appwrite_metrics_collection_id: String,
    /// Collection holding saved movies
    pub appwrite_saved_collection_id: String,
    /// Optional server API key
    pub appwrite_api_key: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_POPULAR_SECS` - Popular listing TTL (default: 1800)
    /// - `CACHE_TTL_SEARCH_SECS` - Search results TTL (default: 600)
    /// - `CACHE_TTL_DETAILS_SECS` - Movie details TTL (default: 3600)
    /// - `CACHE_TTL_TRENDING_SECS` - Trending list TTL (default: 900)
    /// - `CACHE_TTL_SAVED_SECS` - Saved-movies list TTL (default: 300)
    /// - `CACHE_COALESCE` - Single-flight fetches (default: true)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Expiry sweep frequency (default: 0, disabled)
    /// - `CACHE_FILE` - Store file (default: platform cache dir)
    /// - `WATCHMODE_BASE_URL`, `WATCHMODE_API_KEY`
    /// - `APPWRITE_ENDPOINT`, `APPWRITE_PROJECT_ID`, `APPWRITE_DATABASE_ID`,
    ///   `APPWRITE_METRICS_COLLECTION_ID`, `APPWRITE_SAVED_COLLECTION_ID`,
    ///   `APPWRITE_API_KEY`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_popular: parse_var("CACHE_TTL_POPULAR_SECS").unwrap_or(defaults.ttl_popular),
            ttl_search: parse_var("CACHE_TTL_SEARCH_SECS").unwrap_or(defaults.ttl_search),
            ttl_details: parse_var("CACHE_TTL_DETAILS_SECS").unwrap_or(defaults.ttl_details),
            ttl_trending: parse_var("CACHE_TTL_TRENDING_SECS").unwrap_or(defaults.ttl_trending),
            ttl_saved: parse_var("CACHE_TTL_SAVED_SECS").unwrap_or(defaults.ttl_saved),
            coalesce_requests: parse_var("CACHE_COALESCE").unwrap_or(defaults.coalesce_requests),
            sweep_interval: parse_var("CACHE_SWEEP_INTERVAL_SECS")
                .unwrap_or(defaults.sweep_interval),
            cache_file: env::var("CACHE_FILE")
                .ok()
                .map(PathBuf::from)
                .or(defaults.cache_file),
            watchmode_base_url: env::var("WATCHMODE_BASE_URL")
                .unwrap_or(defaults.watchmode_base_url),
            watchmode_api_key: env::var("WATCHMODE_API_KEY").unwrap_or_default(),
            appwrite_endpoint: env::var("APPWRITE_ENDPOINT").unwrap_or(defaults.appwrite_endpoint),
            appwrite_project_id: env::var("APPWRITE_PROJECT_ID").unwrap_or_default(),
            appwrite_database_id: env::var("APPWRITE_DATABASE_ID").unwrap_or_default(),
            appwrite_metrics_collection_id: env::var("APPWRITE_METRICS_COLLECTION_ID")
                .unwrap_or_default(),
            appwrite_saved_collection_id: env::var("APPWRITE_SAVED_COLLECTION_ID")
                .unwrap_or_default(),
            appwrite_api_key: env::var("APPWRITE_API_KEY").ok().filter(|k| !k.is_empty()),
        }
    }

    /// TTL table derived from this configuration.
    pub fn ttl(&self) -> CacheTtl {
        CacheTtl {
            popular: Duration::from_secs(self.ttl_popular),
            search: Duration::from_secs(self.ttl_search),
            details: Duration::from_secs(self.ttl_details),
            trending: Duration::from_secs(self.ttl_trending),
            saved: Duration::from_secs(self.ttl_saved),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_popular: 30 * 60,
            ttl_search: 10 * 60,
            ttl_details: 60 * 60,
            ttl_trending: 15 * 60,
            ttl_saved: 5 * 60,
            coalesce_requests: true,
            sweep_interval: 0,
            cache_file: default_cache_file(),
            watchmode_base_url: DEFAULT_WATCHMODE_BASE_URL.to_string(),
            watchmode_api_key: String::new(),
            appwrite_endpoint: DEFAULT_APPWRITE_ENDPOINT.to_string(),
            appwrite_project_id: String::new(),
            appwrite_database_id: String::new(),
            appwrite_metrics_collection_id: String::new(),
            appwrite_saved_collection_id: String::new(),
            appwrite_api_key: None,
        }
    }
}

// == Cache TTL ==
/// Time-to-live per data kind.
///
/// `search` is kept separate from `popular` so integrators can decide how
/// long search pages stay fresh without touching the listing TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub popular: Duration,
    pub search: Duration,
    pub details: Duration,
    pub trending: Duration,
    pub saved: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Config::default().ttl()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn default_cache_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "movie_cache").map(|dirs| dirs.cache_dir().join("store.json"))
}
