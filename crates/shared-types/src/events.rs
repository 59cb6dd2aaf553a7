//! # Domain Events
//!
//! State changes broadcast to live subscribers.
//!
//! Events are immutable once published. Child events carry the parent
//! identifier so a subscriber can filter on "comments of post N" without
//! resolving the child.

use crate::entities::{Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a domain event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    ChildCreated,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::ChildCreated => "child_created",
        };
        f.write_str(s)
    }
}

/// All events that can be published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A top-level entity was created (user signed up, post published).
    EntityCreated { entity: Entity },

    /// An existing entity changed.
    EntityUpdated { entity: Entity },

    /// A child entity was created under a parent (comment on a post).
    ChildEntityCreated { parent_id: EntityId, entity: Entity },
}

impl DomainEvent {
    pub fn created(entity: impl Into<Entity>) -> Self {
        DomainEvent::EntityCreated {
            entity: entity.into(),
        }
    }

    pub fn updated(entity: impl Into<Entity>) -> Self {
        DomainEvent::EntityUpdated {
            entity: entity.into(),
        }
    }

    pub fn child_created(parent_id: EntityId, entity: impl Into<Entity>) -> Self {
        DomainEvent::ChildEntityCreated {
            parent_id,
            entity: entity.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::EntityCreated { .. } => EventKind::Created,
            DomainEvent::EntityUpdated { .. } => EventKind::Updated,
            DomainEvent::ChildEntityCreated { .. } => EventKind::ChildCreated,
        }
    }

    /// The entity this event is about.
    pub fn entity(&self) -> &Entity {
        match self {
            DomainEvent::EntityCreated { entity }
            | DomainEvent::EntityUpdated { entity }
            | DomainEvent::ChildEntityCreated { entity, .. } => entity,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        self.entity().kind()
    }

    /// Parent identifier, only present on child events.
    pub fn parent_id(&self) -> Option<EntityId> {
        match self {
            DomainEvent::ChildEntityCreated { parent_id, .. } => Some(*parent_id),
            _ => None,
        }
    }

    /// Stable topic label used in logs, e.g. `post.updated`.
    pub fn topic(&self) -> String {
        format!("{}.{}", self.entity_kind(), self.kind())
    }
}
