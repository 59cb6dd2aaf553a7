//! Cost ceilings and scoring knobs.

use serde::{Deserialize, Serialize};

/// Query cost configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Reject operations scoring above this
    pub max_complexity: u64,
    /// Reject operations nested deeper than this
    pub max_depth: usize,
    /// Depth after which field cost is multiplied
    pub penalty_threshold_depth: usize,
    /// Arguments read as a requested page size
    pub page_size_arguments: Vec<String>,
    /// One extra point per this many requested items
    pub page_size_divisor: u64,
    /// Cost of a fragment spread that cannot be expanded
    pub unresolved_fragment_cost: u64,
    /// Field names charged against per-resource admission quotas
    pub expensive_fields: Vec<String>,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            max_complexity: 1_000,
            max_depth: 10,
            penalty_threshold_depth: 5,
            page_size_arguments: vec!["limit".into(), "first".into(), "last".into()],
            page_size_divisor: 10,
            unresolved_fragment_cost: 10,
            expensive_fields: vec!["search".into(), "feed".into()],
        }
    }
}
