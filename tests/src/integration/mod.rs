//! # Integration Flows
//!
//! Each module wires real components together (no component is mocked except
//! the storage backend) and checks the behaviour clients observe.

pub mod fixtures;

mod admission_flow;
mod gateway_flow;
mod loader_flow;
