//! Subscriber handle.

use crate::error::SubscriptionError;
use shared_types::DomainEvent;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use uuid::Uuid;

/// Generated subscriber identifier (UUIDv7, time-ordered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receiving end of one subscriber's queue.
///
/// Dropping it unregisters the subscriber.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Arc<DomainEvent>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriberId, receiver: mpsc::Receiver<Arc<DomainEvent>>) -> Self {
        Self { id, receiver }
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event, or `None` once the subscriber is closed and drained.
    pub async fn recv(&mut self) -> Option<Arc<DomainEvent>> {
        self.receiver.recv().await
    }

    /// Next queued event without waiting.
    ///
    /// - `Ok(Some(event))` - an event was queued
    /// - `Ok(None)` - nothing queued yet
    /// - `Err(SubscriptionError::Closed)` - closed and drained
    pub fn try_recv(&mut self) -> Result<Option<Arc<DomainEvent>>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Stream for Subscription {
    type Item = Arc<DomainEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
