//! Error types for the cache layer and its collaborators
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by the durable store and the envelope codec.
///
/// None of these reach callers of the cache primitives; they are logged
/// and turned into cache misses or no-ops.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Durable store refused or failed the operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem failure in a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed envelope or payload that does not fit the requested type
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Envelope written by an incompatible schema version
    #[error("Envelope schema version {found} does not match {expected}")]
    SchemaMismatch { found: u32, expected: u32 },
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Api Error Enum ==
/// Errors from the movie metadata API.
///
/// Cloneable so a single failed fetch can be handed to every caller
/// waiting on it.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Request never produced a response
    #[error("Request failed: {0}")]
    Transport(Arc<reqwest::Error>),

    /// Non-success HTTP status
    #[error("Failed to fetch {resource}: {status}")]
    Status { resource: String, status: u16 },

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Transport(Arc::new(err))
        }
    }
}

// == Database Error Enum ==
/// Errors from the hosted document database.
#[derive(Error, Debug, Clone)]
pub enum DatabaseError {
    /// Request never produced a response
    #[error("Database request failed: {0}")]
    Transport(Arc<reqwest::Error>),

    /// Database answered with an error status
    #[error("Database returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Document did not match the expected shape
    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for DatabaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DatabaseError::Malformed(err.to_string())
        } else {
            DatabaseError::Transport(Arc::new(err))
        }
    }
}
