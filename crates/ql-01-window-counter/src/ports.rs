//! Outbound port for the shared counter store.

use crate::error::StoreError;
use async_trait::async_trait;
use std::time::Duration;

/// Outcome of a conditional increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Events in the window after this call (including this one if admitted).
    pub count: u64,
    /// Whether the event was recorded.
    pub admitted: bool,
    /// Time until the oldest event leaves the window. Set only when rejected.
    pub retry_after: Option<Duration>,
}

/// Shared atomic counter store.
///
/// Every operation on a single key must be atomic with respect to concurrent
/// callers on the same key, in this process and in every other process
/// sharing the store.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Record one event now and return the number of events in the window.
    async fn increment_and_count(&self, key: &str, window: Duration) -> Result<u64, StoreError>;

    /// Record one event only if fewer than `limit` events are in the window.
    ///
    /// Rejected attempts are not recorded.
    async fn acquire(
        &self,
        key: &str,
        window: Duration,
        limit: u64,
    ) -> Result<WindowSnapshot, StoreError>;

    /// Number of events currently in the window, without recording one.
    async fn count(&self, key: &str, window: Duration) -> Result<u64, StoreError>;

    /// Set the time-to-live of an existing key. Returns false if absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Whether a (non-expired) key exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Create or overwrite a flag key living for `ttl`.
    async fn set(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remaining lifetime of a key, `None` if absent or without TTL.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Remove a key of any type. Returns false if absent.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}
