//! Movie Metadata Module
//!
//! Remote movie API client and the cached adapters screens call.

pub mod api;
mod cached;

pub use api::{MovieApi, WatchModeClient, LISTING_PAGE_SIZE};
pub use cached::CachedMovies;
