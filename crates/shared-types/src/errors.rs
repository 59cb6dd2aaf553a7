//! # Error Types
//!
//! Parse errors for the shared value types.

use thiserror::Error;

/// Errors raised when parsing shared value types from their text form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Entity identifier was not an unsigned integer.
    #[error("invalid entity id: {0}")]
    InvalidEntityId(String),

    /// Operation kind was neither `read` nor `write`.
    #[error("invalid operation kind: {0}")]
    InvalidOperationKind(String),

    /// Entity kind was not one of `user`, `post`, `comment`.
    #[error("invalid entity kind: {0}")]
    InvalidEntityKind(String),
}
