//! # Quill Traffic Layer Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── traffic_benchmarks.rs  # Loader and cost estimator throughput
//! └── src/integration/
//!     ├── fixtures.rs            # Shared storage and entity builders
//!     ├── admission_flow.rs      # Counter store + admission controller
//!     ├── loader_flow.rs         # Loaders over a storage backend
//!     ├── fanout_flow.rs         # Publish/subscribe delivery
//!     └── gateway_flow.rs        # Whole operation lifecycle
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ql-tests
//!
//! # By flow
//! cargo test -p ql-tests integration::admission_flow::
//!
//! # Benchmarks
//! cargo bench -p ql-tests
//! ```

#![allow(dead_code)]

pub mod integration;
