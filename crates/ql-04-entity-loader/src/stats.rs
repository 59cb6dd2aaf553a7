//! Loader counters.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct LoaderStats {
    /// `load` calls, one per key for `load_many`
    pub loads_requested: AtomicU64,
    /// Loads that joined a key already in the open batch
    pub loads_deduplicated: AtomicU64,
    /// Batches handed to storage
    pub batches_dispatched: AtomicU64,
    /// Distinct keys handed to storage
    pub keys_fetched: AtomicU64,
    /// Batches whose fetch failed
    pub failed_batches: AtomicU64,
}

impl LoaderStats {
    pub fn snapshot(&self) -> LoaderStatsSnapshot {
        LoaderStatsSnapshot {
            loads_requested: self.loads_requested.load(Ordering::Relaxed),
            loads_deduplicated: self.loads_deduplicated.load(Ordering::Relaxed),
            batches_dispatched: self.batches_dispatched.load(Ordering::Relaxed),
            keys_fetched: self.keys_fetched.load(Ordering::Relaxed),
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStatsSnapshot {
    pub loads_requested: u64,
    pub loads_deduplicated: u64,
    pub batches_dispatched: u64,
    pub keys_fetched: u64,
    pub failed_batches: u64,
}
