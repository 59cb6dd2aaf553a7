//! # Query Gateway Traffic Wiring
//!
//! Puts the traffic-shaping components in front of the query execution
//! engine. One [`TrafficShaper`] is built per server process and handed to
//! every request handler.
//!
//! ## Operation Flow
//!
//! ```text
//! parsed operation + RequestContext
//!        │
//!        ▼
//! ┌───────────────────┐   pure, no I/O
//! │ QueryCostEstimator│──────────────┐
//! └───────────────────┘              │ expensive fields
//!        │                           ▼
//!        │                ┌─────────────────────┐    ┌──────────────┐
//!        │                │ AdmissionController │───▶│ CounterStore │
//!        │                └─────────────────────┘    └──────────────┘
//!        ▼
//!   cost ceilings ──▶ OperationPermit ──▶ resolvers ──▶ Loaders<S> ──▶ Storage
//!                                             │
//!                                             └── subscribe / publish ──▶ FanoutManager
//! ```
//!
//! A rejection at any step returns a [`GatewayRejection`] naming the scope or
//! ceiling that failed; no resolver runs.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod loaders;
pub mod metrics;
pub mod pipeline;
pub mod telemetry;

pub use config::{ConfigError, GatewayConfig};
pub use error::{codes, ErrorPayload, GatewayRejection};
pub use loaders::{Loaders, Storage, StoredEntity};
pub use metrics::{GatewayMetrics, GatewayMetricsSnapshot};
pub use pipeline::{OperationOutcome, OperationPermit, TrafficShaper};
pub use telemetry::{init_tracing, TelemetryConfig, TelemetryError};
