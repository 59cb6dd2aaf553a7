//! Errors from administrative operations.

use ql_01_window_counter::StoreError;
use thiserror::Error;

/// Failure of an administrative call (reset, ban, usage).
///
/// Admission checks never return this; they resolve store failures through
/// the configured policy and report a [`crate::Rejection`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid scope: {0}")]
    InvalidScope(String),
}
