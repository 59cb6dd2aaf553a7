//! Fan-out counters.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct FanoutStats {
    /// Subscribers registered
    pub subscribed: AtomicU64,
    /// Subscribers removed, for any reason
    pub removed: AtomicU64,
    /// Events published
    pub published: AtomicU64,
    /// Event copies enqueued
    pub delivered: AtomicU64,
    /// Event copies dropped on full or closed queues
    pub dropped: AtomicU64,
}

impl FanoutStats {
    pub fn snapshot(&self) -> FanoutStatsSnapshot {
        FanoutStatsSnapshot {
            subscribed: self.subscribed.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutStatsSnapshot {
    pub subscribed: u64,
    pub removed: u64,
    pub published: u64,
    pub delivered: u64,
    pub dropped: u64,
}
