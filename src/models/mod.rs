//! Data Models Module
//!
//! Payload types cached by the movie adapters and stored in the document
//! database.

mod document;
mod movie;

pub use document::{poster_url, SavedMovie, TrendingMovie, TMDB_IMAGE_BASE};
pub use movie::{Genre, Movie, MovieDetails};
