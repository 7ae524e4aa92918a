//! Cache key derivation per query shape

/// Prefix shared by every popular listing page
pub const MOVIES_PREFIX: &str = "movies_";
/// Prefix of movie detail entries
pub const MOVIE_DETAILS_PREFIX: &str = "movie_details_";
/// Prefix of search result pages
pub const SEARCH_RESULTS_PREFIX: &str = "search_results_";
/// Prefix of every saved-movie entry
pub const SAVED_PREFIX: &str = "saved_";

/// Fixed key of the trending list
pub const TRENDING_KEY: &str = "trending_movies";
/// Fixed key of the saved-movies list
pub const SAVED_MOVIES_KEY: &str = "saved_movies_list";

/// Key of a popular listing page.
pub fn popular_movies_key(page: u32) -> String {
    format!("{MOVIES_PREFIX}popular_page{page}")
}

/// Key of a search result page. Queries are folded to lowercase so that
/// differently-cased searches share one entry.
pub fn search_results_key(query: &str, page: u32) -> String {
    format!("{SEARCH_RESULTS_PREFIX}{}_page{page}", query.to_lowercase())
}

/// Key of a movie's details.
pub fn movie_details_key(movie_id: &str) -> String {
    format!("{MOVIE_DETAILS_PREFIX}{movie_id}")
}
