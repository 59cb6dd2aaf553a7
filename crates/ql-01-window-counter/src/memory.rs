//! In-process counter store.
//!
//! Keys live in a sharded [`DashMap`]; every per-key operation runs under the
//! shard's write guard so increment-and-count is atomic for that key. Uses
//! [`tokio::time::Instant`] so windows follow the runtime clock (and paused
//! test time).

use crate::error::StoreError;
use crate::ports::{CounterStore, WindowSnapshot};
use crate::TTL_GRACE;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Value held under a key.
enum Slot {
    /// Event timestamps, oldest first.
    Window(VecDeque<Instant>),
    /// Presence-only key (bans, markers).
    Flag,
}

struct Entry {
    slot: Slot,
    expires_at: Option<Instant>,
}

impl Entry {
    fn window() -> Self {
        Self {
            slot: Slot::Window(VecDeque::new()),
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn events_mut(&mut self, key: &str) -> Result<&mut VecDeque<Instant>, StoreError> {
        match &mut self.slot {
            Slot::Window(events) => Ok(events),
            Slot::Flag => Err(StoreError::Backend(format!(
                "key {key} holds a flag, not a window"
            ))),
        }
    }
}

/// Drop timestamps that have left the window `(now - window, now]`.
fn purge(events: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = events.front() {
        if now.saturating_duration_since(oldest) >= window {
            events.pop_front();
        } else {
            break;
        }
    }
}

/// Single-process [`CounterStore`].
#[derive(Default)]
pub struct InMemoryCounterStore {
    entries: DashMap<String, Entry>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every key whose TTL has passed. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|key, entry| {
            if entry.is_expired(now) {
                debug!(key = %key, "Removing expired counter key");
                false
            } else {
                true
            }
        });
        before.saturating_sub(self.entries.len())
    }

    /// Number of keys currently held (expired keys included until purged).
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    fn record(&self, key: &str, window: Duration, limit: Option<u64>) -> Result<WindowSnapshot, StoreError> {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(Entry::window);
        if entry.is_expired(now) {
            *entry = Entry::window();
        }

        let events = entry.events_mut(key)?;
        purge(events, now, window);
        let current = events.len() as u64;

        if limit.is_some_and(|limit| current >= limit) {
            let retry_after = events
                .front()
                .map(|oldest| (*oldest + window).saturating_duration_since(now))
                .unwrap_or(window);
            return Ok(WindowSnapshot {
                count: current,
                admitted: false,
                retry_after: Some(retry_after),
            });
        }

        events.push_back(now);
        entry.expires_at = Some(now + window + TTL_GRACE);
        Ok(WindowSnapshot {
            count: current + 1,
            admitted: true,
            retry_after: None,
        })
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment_and_count(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        self.record(key, window, None).map(|snapshot| snapshot.count)
    }

    async fn acquire(
        &self,
        key: &str,
        window: Duration,
        limit: u64,
    ) -> Result<WindowSnapshot, StoreError> {
        self.record(key, window, Some(limit))
    }

    async fn count(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let now = Instant::now();
        let Some(mut entry) = self.entries.get_mut(key) else {
            return Ok(0);
        };
        if entry.is_expired(now) {
            return Ok(0);
        }
        let events = entry.events_mut(key)?;
        purge(events, now, window);
        Ok(events.len() as u64)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return Ok(false),
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        Ok(!expired)
    }

    async fn set(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let entry = Entry {
            slot: Slot::Flag,
            expires_at: Some(Instant::now() + ttl),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = Instant::now();
        Ok(self.entries.get(key).and_then(|entry| {
            entry
                .expires_at
                .filter(|at| *at > now)
                .map(|at| at.saturating_duration_since(now))
        }))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired(now)))
    }
}

/// Background task purging expired keys.
pub async fn cleanup_task(store: Arc<InMemoryCounterStore>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let removed = store.purge_expired();
        if removed > 0 {
            info!(removed = removed, remaining = store.key_count(), "Purged expired counter keys");
        }
    }
}
