//! # Event Fan-out Manager
//!
//! Delivers published domain events to every live subscriber whose filter
//! matches, through one bounded queue per subscriber.
//!
//! ## Subscriber Lifecycle
//!
//! ```text
//!  registering ──(insert under write lock)──▶ active ──▶ closed
//!                                               │
//!                        unsubscribe / cancel / receiver dropped / shutdown
//! ```
//!
//! ## Delivery
//!
//! Publishing snapshots the registry under the read lock, then does a
//! non-blocking `try_send` per matching subscriber. A full queue drops the
//! event for that subscriber only. Delivery is at-most-once and best-effort;
//! each subscriber sees its events in publish order.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod filter;
pub mod manager;
pub mod stats;
pub mod subscription;

pub use config::FanoutConfig;
pub use error::{SubscribeError, SubscriptionError};
pub use filter::EventFilter;
pub use manager::{FanoutManager, PublishReport};
pub use stats::{FanoutStats, FanoutStatsSnapshot};
pub use subscription::{SubscriberId, Subscription};
