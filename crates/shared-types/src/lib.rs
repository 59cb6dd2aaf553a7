//! # Shared Types Crate
//!
//! Domain entities, domain events and the per-request context used across the
//! Quill traffic layer.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every type crossing a crate boundary lives here.
//! - **Immutable Events**: A `DomainEvent` is never mutated after publication;
//!   the fan-out manager shares it behind an `Arc`.
//! - **Opaque Identity**: The credential subsystem hands us an `IdentityId`;
//!   this layer never inspects it beyond using it as a quota scope.

pub mod context;
pub mod duration_serde;
pub mod entities;
pub mod errors;
pub mod events;

pub use context::*;
pub use entities::*;
pub use errors::*;
pub use events::*;
