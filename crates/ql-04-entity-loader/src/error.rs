//! Loader errors.

use thiserror::Error;

/// Failure of a whole batch fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Backend(String),
}

/// Failure delivered to a `load` caller. A missing key is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The batch this key belonged to failed.
    #[error("batch fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The batch task ended without answering.
    #[error("batch dropped before completion")]
    Dropped,
}
