//! Fan-out errors.

use thiserror::Error;

/// Errors from [`crate::FanoutManager::subscribe`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    /// The manager is tearing down.
    #[error("fan-out manager is shutting down")]
    ShuttingDown,

    #[error("too many subscribers (max {max})")]
    TooManySubscribers { max: usize },
}

/// Errors from receiving on a [`crate::Subscription`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The subscriber was removed and its queue drained.
    #[error("subscription closed")]
    Closed,
}
