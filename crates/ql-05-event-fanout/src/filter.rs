//! Ready-made subscriber filters.

use shared_types::{DomainEvent, EntityId, EntityKind, EventKind};

/// Declarative event filter. Empty criteria match everything.
///
/// Any `Fn(&DomainEvent) -> bool` can be used as a filter; this type covers
/// the subscriptions the query schema exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Event kinds to include. Empty means all kinds.
    pub kinds: Vec<EventKind>,
    /// Entity kinds to include. Empty means all entity kinds.
    pub entity_kinds: Vec<EntityKind>,
    /// Only child events under this parent.
    pub parent: Option<EntityId>,
    /// Only events about this exact entity.
    pub entity: Option<(EntityKind, EntityId)>,
}

impl EventFilter {
    /// Accept every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kinds(kinds: Vec<EventKind>) -> Self {
        Self {
            kinds,
            ..Self::default()
        }
    }

    /// Child-entity events under `parent` (e.g. new comments on a post).
    #[must_use]
    pub fn children_of(parent: EntityId) -> Self {
        Self {
            kinds: vec![EventKind::ChildCreated],
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Events about one entity.
    #[must_use]
    pub fn entity(kind: EntityKind, id: EntityId) -> Self {
        Self {
            entity: Some((kind, id)),
            ..Self::default()
        }
    }

    /// Narrow to some entity kinds.
    #[must_use]
    pub fn with_entity_kinds(mut self, entity_kinds: Vec<EntityKind>) -> Self {
        self.entity_kinds = entity_kinds;
        self
    }

    #[must_use]
    pub fn matches(&self, event: &DomainEvent) -> bool {
        let kind_match = self.kinds.is_empty() || self.kinds.contains(&event.kind());
        let entity_kind_match =
            self.entity_kinds.is_empty() || self.entity_kinds.contains(&event.entity_kind());
        let parent_match = self
            .parent
            .map_or(true, |parent| event.parent_id() == Some(parent));
        let entity_match = self.entity.map_or(true, |(kind, id)| {
            event.entity_kind() == kind && event.entity().id() == id
        });

        kind_match && entity_kind_match && parent_match && entity_match
    }

    /// Turn into a predicate accepted by `FanoutManager::subscribe`.
    pub fn into_predicate(self) -> impl Fn(&DomainEvent) -> bool + Send + Sync + 'static {
        move |event: &DomainEvent| self.matches(event)
    }
}
