//! Documents kept in the hosted database

use serde::{Deserialize, Serialize};

use crate::models::Movie;

/// Image host prepended to bare poster paths
pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// View-count document for one movie; the trending list is the top of
/// this collection by `count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingMovie {
    #[serde(rename = "$id", default)]
    pub document_id: String,
    pub movie_id: i64,
    pub title: String,
    pub count: u64,
    #[serde(default)]
    pub poster_url: String,
}

/// A movie on the user's watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMovie {
    #[serde(rename = "$id", default)]
    pub document_id: String,
    pub movie_id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
}

impl SavedMovie {
    /// Watchlist entry for `movie`, not yet stored.
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            document_id: String::new(),
            movie_id: movie.id,
            title: movie.title.clone(),
            poster_url: poster_url(movie.poster_path.as_deref()),
            release_date: movie.release_date.clone(),
            vote_average: movie.vote_average,
        }
    }
}

/// Absolute poster URL. Full URLs are kept; bare paths are resolved
/// against the TMDB image host.
pub fn poster_url(poster_path: Option<&str>) -> String {
    match poster_path {
        Some(path) if path.starts_with("http") => path.to_string(),
        Some(path) => format!("{TMDB_IMAGE_BASE}{path}"),
        None => String::new(),
    }
}
