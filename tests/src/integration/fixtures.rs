//! Shared fixtures for integration flows.

use async_trait::async_trait;
use parking_lot::Mutex;
use ql_04_entity_loader::FetchError;
use ql_gateway::Storage;
use shared_types::{Comment, Entity, EntityId, EntityKind, Post, User};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};

pub fn ip(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(1, 2, 3, last))
}

pub fn user(id: u64) -> User {
    User {
        id: EntityId(id),
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        created_at: 1_700_000_000_000,
    }
}

pub fn post(id: u64, author: u64) -> Post {
    Post {
        id: EntityId(id),
        author_id: EntityId(author),
        title: format!("Post {id}"),
        body: "lorem ipsum".into(),
        published: true,
        created_at: 1_700_000_000_000,
        updated_at: 1_700_000_000_000,
    }
}

pub fn comment(id: u64, post_id: u64, author: u64) -> Comment {
    Comment {
        id: EntityId(id),
        post_id: EntityId(post_id),
        author_id: EntityId(author),
        body: format!("comment {id}"),
        created_at: 1_700_000_000_000,
    }
}

/// Storage backend holding entities in memory.
///
/// Records every batch it serves and returns rows in reverse request order
/// so callers cannot rely on ordering.
#[derive(Default)]
pub struct RecordingStorage {
    rows: HashMap<(EntityKind, EntityId), Entity>,
    calls: Mutex<Vec<(EntityKind, Vec<EntityId>)>>,
    unavailable: AtomicBool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, entity: impl Into<Entity>) -> Self {
        let entity = entity.into();
        self.rows.insert((entity.kind(), entity.id()), entity);
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(EntityKind, Vec<EntityId>)> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, kind: EntityKind) -> Vec<Vec<EntityId>> {
        self.calls
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, ids)| ids.clone())
            .collect()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn fetch_by_ids(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
    ) -> Result<Vec<Entity>, FetchError> {
        self.calls.lock().push((kind, ids.to_vec()));
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FetchError::Unavailable("connection refused".into()));
        }
        Ok(ids
            .iter()
            .rev()
            .filter_map(|id| self.rows.get(&(kind, *id)).cloned())
            .collect())
    }
}
