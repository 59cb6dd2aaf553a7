//! # Sliding-Window Counter
//!
//! Atomic increment-and-count of timestamped events within a trailing time
//! window, backed by a counter store that every server process can reach.
//!
//! ## Window Semantics
//!
//! ```text
//!            window W
//!   ├──────────────────────────┤
//!   ●    ●  ●         ●      ● │  ← events still counted
//!   now-W                     now
//! ```
//!
//! An event recorded at `t` counts while `now - t < W`. Expired timestamps are
//! purged lazily on the next access to the same key, so a window never needs a
//! background sweeper to stay correct. Each key also carries a TTL slightly
//! longer than its window so idle keys disappear from the store.
//!
//! ## Ports
//!
//! - [`CounterStore`]: the shared store contract (the store, not process
//!   memory, is authoritative).
//! - [`InMemoryCounterStore`]: single-process adapter used by tests and by
//!   single-node deployments.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod memory;
pub mod ports;

pub use error::StoreError;
pub use memory::{cleanup_task, InMemoryCounterStore};
pub use ports::{CounterStore, WindowSnapshot};

/// Extra lifetime given to a counter key beyond its window.
pub const TTL_GRACE: std::time::Duration = std::time::Duration::from_secs(1);
