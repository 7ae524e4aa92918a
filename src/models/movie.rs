//! Movie metadata as returned by the movie API adapters

use serde::{Deserialize, Serialize};

/// A movie as shown in listings and search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub adult: bool,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub popularity: f64,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub video: bool,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
}

impl Movie {
    /// A listing entry carrying only an id, a title and a year.
    pub fn minimal(id: i64, title: impl Into<String>, year: Option<i32>) -> Self {
        let title = title.into();
        Self {
            id,
            original_title: title.clone(),
            title,
            adult: false,
            backdrop_path: None,
            genre_ids: Vec::new(),
            original_language: "en".to_string(),
            overview: String::new(),
            popularity: 0.0,
            poster_path: None,
            release_date: year.map(|y| y.to_string()).unwrap_or_default(),
            video: false,
            vote_average: 0.0,
            vote_count: 0,
        }
    }
}

/// A named genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Full details of one movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub runtime: u32,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl From<&MovieDetails> for Movie {
    fn from(details: &MovieDetails) -> Self {
        Self {
            backdrop_path: details.backdrop_path.clone(),
            genre_ids: details.genres.iter().map(|g| g.id).collect(),
            overview: details.overview.clone(),
            poster_path: details.poster_path.clone(),
            release_date: details.release_date.clone(),
            vote_average: details.vote_average,
            ..Movie::minimal(details.id, details.title.clone(), None)
        }
    }
}
