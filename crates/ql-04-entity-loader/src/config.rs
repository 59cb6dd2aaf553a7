//! Loader batching knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Batch collection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Distinct keys after which a batch is dispatched immediately
    pub max_batch_size: usize,
    /// Time a batch stays open after its first key
    #[serde(with = "shared_types::duration_serde")]
    pub batch_wait: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            batch_wait: Duration::from_millis(10),
        }
    }
}
