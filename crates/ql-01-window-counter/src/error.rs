//! Counter store errors.

use thiserror::Error;

/// Errors surfaced by a [`crate::CounterStore`].
///
/// Callers decide the policy; the store never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("counter store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer within the caller's budget.
    #[error("counter store timed out")]
    Timeout,

    /// The store answered with an error.
    #[error("counter store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the failure is transient and the operation may be retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout)
    }
}
