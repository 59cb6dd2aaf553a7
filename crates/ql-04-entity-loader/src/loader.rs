//! The loader and its pending batch.

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::ports::BatchFetch;
use crate::stats::{LoaderStats, LoaderStatsSnapshot};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// `Ok(None)` means the key was not found.
pub type LoadResult<V> = Result<Option<V>, LoadError>;

type Waiter<V> = oneshot::Sender<LoadResult<V>>;

/// Keys collected during one open window.
struct PendingBatch<K, V> {
    generation: u64,
    /// Distinct keys in submission order.
    keys: Vec<K>,
    waiters: HashMap<K, Vec<Waiter<V>>>,
}

impl<K, V> PendingBatch<K, V> {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            keys: Vec::new(),
            waiters: HashMap::new(),
        }
    }
}

struct State<K, V> {
    /// The batch currently collecting keys, if any.
    collecting: Option<PendingBatch<K, V>>,
    next_generation: u64,
}

struct Shared<F: BatchFetch> {
    fetcher: F,
    config: LoaderConfig,
    state: Mutex<State<F::Key, F::Value>>,
    stats: LoaderStats,
}

/// Batching, deduplicating loader for one entity type.
///
/// Cloning is cheap; clones share the pending batch. Must be used from within
/// a Tokio runtime since batches are dispatched on spawned tasks.
pub struct EntityLoader<F: BatchFetch> {
    shared: Arc<Shared<F>>,
}

impl<F: BatchFetch> Clone for EntityLoader<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: BatchFetch> EntityLoader<F> {
    pub fn new(fetcher: F, config: LoaderConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                fetcher,
                config,
                state: Mutex::new(State {
                    collecting: None,
                    next_generation: 0,
                }),
                stats: LoaderStats::default(),
            }),
        }
    }

    /// Load one entity, joining the open batch.
    pub async fn load(&self, key: F::Key) -> LoadResult<F::Value> {
        let rx = self.enqueue(key);
        rx.await.unwrap_or(Err(LoadError::Dropped))
    }

    /// Load several entities. One result per input key, in input order.
    pub async fn load_many(&self, keys: &[F::Key]) -> Vec<LoadResult<F::Value>> {
        let receivers: Vec<_> = keys.iter().cloned().map(|key| self.enqueue(key)).collect();
        futures::future::join_all(
            receivers
                .into_iter()
                .map(|rx| async move { rx.await.unwrap_or(Err(LoadError::Dropped)) }),
        )
        .await
    }

    /// Seal the collecting batch if it holds `key`, so the next `load` of
    /// `key` opens a fresh batch. Returns whether a batch was sealed.
    pub fn clear(&self, key: &F::Key) -> bool {
        let sealed = {
            let mut state = self.shared.state.lock();
            let holds_key = state
                .collecting
                .as_ref()
                .is_some_and(|batch| batch.waiters.contains_key(key));
            if holds_key {
                state.collecting.take()
            } else {
                None
            }
        };
        self.seal(sealed)
    }

    /// Seal whatever batch is collecting. Returns whether one was sealed.
    pub fn clear_all(&self) -> bool {
        let sealed = self.shared.state.lock().collecting.take();
        self.seal(sealed)
    }

    /// Distinct keys in the collecting batch.
    pub fn pending_keys(&self) -> usize {
        self.shared
            .state
            .lock()
            .collecting
            .as_ref()
            .map_or(0, |batch| batch.keys.len())
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.shared.config
    }

    pub fn stats(&self) -> LoaderStatsSnapshot {
        self.shared.stats.snapshot()
    }

    fn seal(&self, batch: Option<PendingBatch<F::Key, F::Value>>) -> bool {
        match batch {
            Some(batch) => {
                debug!(generation = batch.generation, "Sealing batch early");
                self.dispatch(batch);
                true
            }
            None => false,
        }
    }

    /// Add a key to the collecting batch, opening one if needed.
    fn enqueue(&self, key: F::Key) -> oneshot::Receiver<LoadResult<F::Value>> {
        let (tx, rx) = oneshot::channel();
        let shared = &self.shared;
        shared.stats.loads_requested.fetch_add(1, Ordering::Relaxed);

        let mut opened = None;
        let full = {
            let mut state = shared.state.lock();
            let State {
                collecting,
                next_generation,
            } = &mut *state;

            let batch = collecting.get_or_insert_with(|| {
                let generation = *next_generation;
                *next_generation += 1;
                opened = Some(generation);
                PendingBatch::new(generation)
            });

            match batch.waiters.get_mut(&key) {
                Some(waiters) => {
                    waiters.push(tx);
                    shared.stats.loads_deduplicated.fetch_add(1, Ordering::Relaxed);
                }
                None => {
                    batch.keys.push(key.clone());
                    batch.waiters.insert(key, vec![tx]);
                }
            }

            if batch.keys.len() >= shared.config.max_batch_size.max(1) {
                collecting.take()
            } else {
                None
            }
        };

        match (full, opened) {
            (Some(batch), _) => self.dispatch(batch),
            (None, Some(generation)) => self.schedule(generation),
            (None, None) => {}
        }
        rx
    }

    /// Dispatch batch `generation` once `batch_wait` elapses, unless it was
    /// already dispatched.
    fn schedule(&self, generation: u64) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::time::sleep(shared.config.batch_wait).await;
            let batch = {
                let mut state = shared.state.lock();
                let still_open = state
                    .collecting
                    .as_ref()
                    .is_some_and(|batch| batch.generation == generation);
                if still_open {
                    state.collecting.take()
                } else {
                    None
                }
            };
            if let Some(batch) = batch {
                shared.execute(batch).await;
            }
        });
    }

    fn dispatch(&self, batch: PendingBatch<F::Key, F::Value>) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.execute(batch).await });
    }
}

impl<F: BatchFetch> Shared<F> {
    /// Fetch a closed batch and answer every waiter.
    async fn execute(&self, batch: PendingBatch<F::Key, F::Value>) {
        let PendingBatch {
            generation,
            keys,
            mut waiters,
        } = batch;
        self.stats.batches_dispatched.fetch_add(1, Ordering::Relaxed);
        self.stats
            .keys_fetched
            .fetch_add(keys.len() as u64, Ordering::Relaxed);
        debug!(generation = generation, keys = keys.len(), "Dispatching batch");

        match self.fetcher.fetch(&keys).await {
            Ok(mut found) => {
                for key in &keys {
                    let value = found.remove(key);
                    for tx in waiters.remove(key).unwrap_or_default() {
                        let _ = tx.send(Ok(value.clone()));
                    }
                }
                if !found.is_empty() {
                    warn!(
                        generation = generation,
                        unrequested = found.len(),
                        "Storage returned keys that were not requested"
                    );
                }
            }
            Err(err) => {
                self.stats.failed_batches.fetch_add(1, Ordering::Relaxed);
                warn!(generation = generation, keys = keys.len(), error = %err, "Batch fetch failed");
                for tx in waiters.into_values().flatten() {
                    let _ = tx.send(Err(LoadError::Fetch(err.clone())));
                }
            }
        }
    }
}
