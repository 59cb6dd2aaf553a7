//! Subscriber registry and publish path.

use crate::config::FanoutConfig;
use crate::error::SubscribeError;
use crate::stats::{FanoutStats, FanoutStatsSnapshot};
use crate::subscription::{SubscriberId, Subscription};
use parking_lot::RwLock;
use shared_types::DomainEvent;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

type Predicate = Arc<dyn Fn(&DomainEvent) -> bool + Send + Sync>;

struct Subscriber {
    filter: Predicate,
    sender: mpsc::Sender<Arc<DomainEvent>>,
    /// Dropped with the entry; wakes the watcher task.
    _removed: oneshot::Sender<()>,
}

struct Inner {
    config: FanoutConfig,
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
    shutting_down: AtomicBool,
    stats: FanoutStats,
}

impl Inner {
    fn remove(&self, id: SubscriberId, reason: &'static str) -> bool {
        let removed = self.subscribers.write().remove(&id);
        match removed {
            Some(_) => {
                self.stats.removed.fetch_add(1, Ordering::Relaxed);
                debug!(subscriber = %id, reason = reason, "Subscriber removed");
                true
            }
            None => false,
        }
    }
}

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers whose filter accepted the event.
    pub matched: usize,
    /// Copies enqueued.
    pub delivered: usize,
    /// Copies dropped on a full or closed queue.
    pub dropped: usize,
}

/// Registry of live subscribers.
///
/// Cloning shares the registry. `subscribe` spawns a watcher task, so it must
/// be called from within a Tokio runtime.
#[derive(Clone)]
pub struct FanoutManager {
    inner: Arc<Inner>,
}

impl FanoutManager {
    pub fn new(config: FanoutConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                subscribers: RwLock::new(HashMap::new()),
                shutting_down: AtomicBool::new(false),
                stats: FanoutStats::default(),
            }),
        }
    }

    /// Register a subscriber. It is removed when `cancel` completes, when the
    /// returned [`Subscription`] is dropped, or on `unsubscribe`/`shutdown`.
    pub fn subscribe<P, C>(&self, filter: P, cancel: C) -> Result<Subscription, SubscribeError>
    where
        P: Fn(&DomainEvent) -> bool + Send + Sync + 'static,
        C: Future<Output = ()> + Send + 'static,
    {
        let capacity = self.inner.config.queue_capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let (removed_tx, removed_rx) = oneshot::channel();
        let id = SubscriberId::new();

        {
            let mut subscribers = self.inner.subscribers.write();
            if self.inner.shutting_down.load(Ordering::SeqCst) {
                return Err(SubscribeError::ShuttingDown);
            }
            if let Some(max) = self.inner.config.max_subscribers {
                if subscribers.len() >= max {
                    return Err(SubscribeError::TooManySubscribers { max });
                }
            }
            subscribers.insert(
                id,
                Subscriber {
                    filter: Arc::new(filter),
                    sender: sender.clone(),
                    _removed: removed_tx,
                },
            );
        }
        self.inner.stats.subscribed.fetch_add(1, Ordering::Relaxed);
        debug!(subscriber = %id, capacity = capacity, "Subscriber registered");

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let reason = tokio::select! {
                _ = cancel => "cancelled",
                _ = sender.closed() => "receiver dropped",
                _ = removed_rx => return,
            };
            if let Some(inner) = inner.upgrade() {
                inner.remove(id, reason);
            }
        });

        Ok(Subscription::new(id, receiver))
    }

    /// Enqueue `event` for every matching subscriber without waiting.
    pub fn publish(&self, event: DomainEvent) -> PublishReport {
        let event = Arc::new(event);
        let snapshot: Vec<(SubscriberId, Predicate, mpsc::Sender<Arc<DomainEvent>>)> = self
            .inner
            .subscribers
            .read()
            .iter()
            .map(|(id, s)| (*id, Arc::clone(&s.filter), s.sender.clone()))
            .collect();

        let payload: &DomainEvent = &event;
        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        for (id, filter, sender) in snapshot {
            if !filter(payload) {
                continue;
            }
            report.matched += 1;
            match sender.try_send(Arc::clone(&event)) {
                Ok(()) => report.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    report.dropped += 1;
                    debug!(subscriber = %id, topic = %payload.topic(), "Subscriber queue full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    report.dropped += 1;
                    closed.push(id);
                }
            }
        }

        for id in closed {
            self.inner.remove(id, "queue closed");
        }

        let stats = &self.inner.stats;
        stats.published.fetch_add(1, Ordering::Relaxed);
        stats
            .delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        stats
            .dropped
            .fetch_add(report.dropped as u64, Ordering::Relaxed);
        report
    }

    /// Remove a subscriber and close its queue. Queued events stay readable.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.inner.remove(id, "unsubscribed")
    }

    pub fn active_subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Close every subscriber and refuse new ones. Returns how many closed.
    pub fn shutdown(&self) -> usize {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        let drained: Vec<Subscriber> = self
            .inner
            .subscribers
            .write()
            .drain()
            .map(|(_, s)| s)
            .collect();

        let closed = drained.len();
        self.inner
            .stats
            .removed
            .fetch_add(closed as u64, Ordering::Relaxed);
        info!(closed = closed, "Fan-out manager shut down");
        closed
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &FanoutConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> FanoutStatsSnapshot {
        self.inner.stats.snapshot()
    }
}
