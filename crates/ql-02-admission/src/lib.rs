//! # Admission Controller
//!
//! Decides whether an operation may proceed before it consumes backend
//! resources. Quotas are sliding-window counters kept in the shared
//! [`CounterStore`](ql_01_window_counter::CounterStore).
//!
//! ## Evaluation Order
//!
//! ```text
//! ┌───────────┐   ┌────────┐   ┌────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐
//! │ ban check │──▶│ global │──▶│ origin │──▶│ identity │──▶│ operation │──▶│ resource │
//! └───────────┘   └────────┘   └────────┘   └──────────┘   └───────────┘   └──────────┘
//!       │              │            │             │               │               │
//!       └──────────────┴────────────┴─────────────┴───────────────┴───────────────┘
//!                              first failure short-circuits
//! ```
//!
//! Each scope is checked over a short and a long window. A check increments
//! the counter atomically with the comparison. Scopes charged before a
//! failing one are not refunded: a rejected request still costs against the
//! scopes it passed.
//!
//! ## Store Failures
//!
//! Every store call is bounded by `store_timeout`. A timeout always rejects
//! with [`RejectionReason::StoreUnavailable`]. Other store errors follow
//! [`FailurePolicy`].

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod controller;
pub mod decision;
pub mod error;
pub mod scope;
pub mod stats;

pub use config::{AdmissionConfig, FailurePolicy, QuotaRule, ScopeQuota};
pub use controller::{AdmissionController, AdmissionRequest};
pub use decision::{Admission, ChargedScope, Rejection, RejectionReason, ScopeUsage};
pub use error::AdmissionError;
pub use scope::{Scope, Window};
pub use stats::{AdmissionStats, AdmissionStatsSnapshot};
