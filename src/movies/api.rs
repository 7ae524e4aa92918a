//! Movie API client
//!
//! Talks to the WatchMode REST API and maps its responses onto [`Movie`]
//! and [`MovieDetails`].

use async_trait::async_trait;
use futures::future::join_all;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{Genre, Movie, MovieDetails};

/// Titles requested per popular listing page
pub const LISTING_PAGE_SIZE: u32 = 20;

/// Remote source of movie metadata.
#[async_trait]
pub trait MovieApi: Send + Sync {
    /// Popular movies when `query` is blank, otherwise search results.
    async fn fetch_movies(&self, query: &str, page: u32) -> Result<Vec<Movie>, ApiError>;

    /// Full details of one movie.
    async fn fetch_movie_details(&self, movie_id: &str) -> Result<MovieDetails, ApiError>;
}

// == Wire types ==

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    results: Vec<AutocompleteResult>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResult {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    relevance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ListTitlesResponse {
    #[serde(default)]
    titles: Vec<ListedTitle>,
}

#[derive(Debug, Clone, Deserialize)]
struct ListedTitle {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct TitleDetails {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    original_language: Option<String>,
    #[serde(default)]
    plot_overview: Option<String>,
    #[serde(default)]
    runtime_minutes: Option<u32>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    backdrop: Option<String>,
    #[serde(default)]
    user_rating: Option<f64>,
    #[serde(default)]
    relevance_percentile: Option<f64>,
    #[serde(default)]
    genres: Vec<i64>,
    #[serde(default)]
    genre_names: Vec<String>,
}

impl TitleDetails {
    fn into_details(self) -> MovieDetails {
        let genres = self
            .genres
            .iter()
            .zip(self.genre_names)
            .map(|(id, name)| Genre { id: *id, name })
            .collect();
        MovieDetails {
            id: self.id,
            title: self.title.unwrap_or_default(),
            overview: self.plot_overview.unwrap_or_default(),
            poster_path: self.poster,
            backdrop_path: self.backdrop,
            release_date: self.release_date.unwrap_or_default(),
            vote_average: self.user_rating.unwrap_or_default(),
            runtime: self.runtime_minutes.unwrap_or_default(),
            genres,
        }
    }

    fn into_movie(self, listed: &ListedTitle) -> Movie {
        let title = self
            .title
            .or_else(|| listed.title.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let mut movie = Movie::minimal(self.id, title.clone(), listed.year);
        movie.original_title = self.original_title.unwrap_or(title);
        if let Some(language) = self.original_language {
            movie.original_language = language;
        }
        if let Some(date) = self.release_date.filter(|d| !d.is_empty()) {
            movie.release_date = date;
        }
        movie.backdrop_path = self.backdrop;
        movie.poster_path = self.poster;
        movie.genre_ids = self.genres;
        movie.overview = self.plot_overview.unwrap_or_default();
        movie.popularity = self.relevance_percentile.unwrap_or_default();
        movie.vote_average = self.user_rating.unwrap_or_default();
        movie
    }
}

// == WatchMode Client ==
/// HTTP client for the WatchMode API.
#[derive(Debug, Clone)]
pub struct WatchModeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WatchModeClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.watchmode_base_url, &config.watchmode_api_key)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        resource: &str,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("apiKey", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    async fn title_details(&self, movie_id: &str) -> Result<TitleDetails, ApiError> {
        self.get_json(&format!("/title/{movie_id}/details/"), &[], "movie details")
            .await
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<Movie>, ApiError> {
        // Autocomplete returns a single page of matches.
        if page > 1 {
            return Ok(Vec::new());
        }
        let response: AutocompleteResponse = self
            .get_json(
                "/autocomplete-search/",
                &[
                    ("search_value", query.to_string()),
                    ("search_type", "3".to_string()),
                ],
                "movies",
            )
            .await?;

        Ok(response
            .results
            .into_iter()
            .map(|item| {
                let mut movie =
                    Movie::minimal(item.id, item.name.unwrap_or_else(|| "Unknown".into()), item.year);
                movie.poster_path = item.image_url.clone();
                movie.backdrop_path = item.image_url;
                movie.popularity = item.relevance.unwrap_or_default();
                movie
            })
            .collect())
    }

    async fn popular(&self, page: u32) -> Result<Vec<Movie>, ApiError> {
        let response: ListTitlesResponse = self
            .get_json(
                "/list-titles/",
                &[
                    ("types", "movie".to_string()),
                    ("sort_by", "popularity_desc".to_string()),
                    ("limit", LISTING_PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                ],
                "movies",
            )
            .await?;

        // Listings carry no artwork, so each title is enriched from its
        // details; a failed lookup falls back to the bare listing.
        let lookups = response.titles.iter().map(|listed| async move {
            match self.title_details(&listed.id.to_string()).await {
                Ok(details) => details.into_movie(listed),
                Err(err) => {
                    warn!("Error fetching details for movie {}: {}", listed.id, err);
                    Movie::minimal(
                        listed.id,
                        listed.title.clone().unwrap_or_else(|| "Unknown".into()),
                        listed.year,
                    )
                }
            }
        });
        Ok(join_all(lookups).await)
    }
}

#[async_trait]
impl MovieApi for WatchModeClient {
    async fn fetch_movies(&self, query: &str, page: u32) -> Result<Vec<Movie>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            self.popular(page).await
        } else {
            self.search(query, page).await
        }
    }

    async fn fetch_movie_details(&self, movie_id: &str) -> Result<MovieDetails, ApiError> {
        Ok(self.title_details(movie_id).await?.into_details())
    }
}
