//! Fan-out limits.

use serde::{Deserialize, Serialize};

/// Fan-out manager configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Events buffered per subscriber before new ones are dropped
    pub queue_capacity: usize,
    /// Registry size limit (`None` = unlimited)
    pub max_subscribers: Option<usize>,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_subscribers: Some(10_000),
        }
    }
}
