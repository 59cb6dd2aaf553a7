//! Cost ceiling rejections.

use thiserror::Error;

/// A ceiling was exceeded. Names the ceiling and the computed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CostRejection {
    #[error("query depth {depth} exceeds maximum depth {max}")]
    DepthExceeded { depth: usize, max: usize },

    #[error("query complexity {score} exceeds maximum complexity {max}")]
    ComplexityExceeded { score: u64, max: u64 },
}

impl CostRejection {
    /// Configuration name of the exceeded ceiling.
    pub fn ceiling(&self) -> &'static str {
        match self {
            CostRejection::DepthExceeded { .. } => "max_depth",
            CostRejection::ComplexityExceeded { .. } => "max_complexity",
        }
    }

    /// The computed value that broke the ceiling.
    pub fn value(&self) -> u64 {
        match self {
            CostRejection::DepthExceeded { depth, .. } => *depth as u64,
            CostRejection::ComplexityExceeded { score, .. } => *score,
        }
    }
}
