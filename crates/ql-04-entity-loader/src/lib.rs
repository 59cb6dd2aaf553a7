//! # Batched Entity Loader
//!
//! Coalesces point lookups issued by concurrent resolvers into few storage
//! round-trips.
//!
//! ## Batch Lifecycle
//!
//! ```text
//!   load(k1) ──┐
//!   load(k2) ──┼──▶ PendingBatch [k1, k2]  (same key twice = one entry)
//!   load(k1) ──┘         │
//!                        │ batch_wait elapsed OR max_batch_size reached
//!                        ▼
//!               fetch([k1, k2]) ──▶ {k2: v2}
//!                        │
//!                        ▼
//!   k1 callers ◀── Ok(None)      k2 caller ◀── Ok(Some(v2))
//! ```
//!
//! A failed fetch delivers the same error to every caller of that batch.
//! There is no cache: once a batch is delivered its results are forgotten.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod loader;
pub mod ports;
pub mod stats;

pub use config::LoaderConfig;
pub use error::{FetchError, LoadError};
pub use loader::{EntityLoader, LoadResult};
pub use ports::BatchFetch;
pub use stats::{LoaderStats, LoaderStatsSnapshot};
