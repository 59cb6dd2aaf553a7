//! # Query Cost Estimator
//!
//! Scores the parsed, unexecuted selection tree of one operation and rejects
//! it before any resolver runs when it is too complex or too deep.
//!
//! ## Scoring
//!
//! ```text
//! field cost   = (1 + page_size / divisor) × depth_factor
//! depth_factor = 1                          if depth ≤ threshold
//!              = depth − threshold + 1      otherwise
//! score        = Σ field cost over the expanded tree
//! ```
//!
//! - `__`-prefixed meta fields cost nothing and add no depth.
//! - Fragment spreads are expanded; unknown or cyclic spreads cost a fixed
//!   conservative amount.
//! - Inline fragments are transparent.
//!
//! Depth is checked before complexity, so a deep query reports the depth
//! ceiling even if it is also too expensive.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod ast;
pub mod config;
pub mod error;
pub mod estimator;

pub use ast::{
    ArgValue, Field, FragmentDefinition, OperationDefinition, OperationType, QueryDocument,
    Selection,
};
pub use config::CostConfig;
pub use error::CostRejection;
pub use estimator::{CostReport, QueryCostEstimator, Variables};
