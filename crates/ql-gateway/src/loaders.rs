//! Per-operation entity loaders over the storage port.

use async_trait::async_trait;
use ql_04_entity_loader::{BatchFetch, EntityLoader, FetchError, LoadResult, LoaderConfig};
use shared_types::{Comment, Entity, EntityId, EntityKind, Post, User};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Storage collaborator.
///
/// Returns the entities of `kind` found among `ids`, in any order. Ids with no
/// entity are simply absent from the result.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn fetch_by_ids(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
    ) -> Result<Vec<Entity>, FetchError>;
}

/// An entity type with its own loader.
pub trait StoredEntity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Unwrap from [`Entity`]; `None` if it holds another kind.
    fn from_entity(entity: Entity) -> Option<Self>;
}

impl StoredEntity for User {
    const KIND: EntityKind = EntityKind::User;

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::User(user) => Some(user),
            _ => None,
        }
    }
}

impl StoredEntity for Post {
    const KIND: EntityKind = EntityKind::Post;

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Post(post) => Some(post),
            _ => None,
        }
    }
}

impl StoredEntity for Comment {
    const KIND: EntityKind = EntityKind::Comment;

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Comment(comment) => Some(comment),
            _ => None,
        }
    }
}

/// [`BatchFetch`] for one entity kind.
pub struct KindFetch<S, T> {
    storage: Arc<S>,
    _kind: PhantomData<fn() -> T>,
}

impl<S, T> KindFetch<S, T> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<S: Storage, T: StoredEntity> BatchFetch for KindFetch<S, T> {
    type Key = EntityId;
    type Value = T;

    async fn fetch(&self, keys: &[EntityId]) -> Result<HashMap<EntityId, T>, FetchError> {
        let entities = self.storage.fetch_by_ids(T::KIND, keys).await?;
        let expected = T::KIND;
        let mut found = HashMap::with_capacity(entities.len());
        for entity in entities {
            let id = entity.id();
            let kind = entity.kind();
            match T::from_entity(entity) {
                Some(value) => {
                    found.insert(id, value);
                }
                None => warn!(
                    expected = %expected,
                    actual = %kind,
                    id = %id,
                    "Storage returned entity of wrong kind, ignoring"
                ),
            }
        }
        Ok(found)
    }
}

/// The loaders of one operation.
///
/// Build a fresh set per operation: batches never outlive their wait
/// interval and nothing is cached across operations.
pub struct Loaders<S: Storage> {
    pub users: EntityLoader<KindFetch<S, User>>,
    pub posts: EntityLoader<KindFetch<S, Post>>,
    pub comments: EntityLoader<KindFetch<S, Comment>>,
}

impl<S: Storage> Loaders<S> {
    pub fn new(storage: Arc<S>, config: LoaderConfig) -> Self {
        Self {
            users: EntityLoader::new(KindFetch::new(storage.clone()), config),
            posts: EntityLoader::new(KindFetch::new(storage.clone()), config),
            comments: EntityLoader::new(KindFetch::new(storage), config),
        }
    }

    /// Load any entity by kind and id.
    pub async fn load(&self, kind: EntityKind, id: EntityId) -> LoadResult<Entity> {
        match kind {
            EntityKind::User => Ok(self.users.load(id).await?.map(Entity::from)),
            EntityKind::Post => Ok(self.posts.load(id).await?.map(Entity::from)),
            EntityKind::Comment => Ok(self.comments.load(id).await?.map(Entity::from)),
        }
    }

    /// Seal and dispatch the collecting batch of `kind`'s loader if it holds
    /// `id`, so the next load of `id` opens a fresh batch.
    pub fn clear(&self, kind: EntityKind, id: EntityId) -> bool {
        match kind {
            EntityKind::User => self.users.clear(&id),
            EntityKind::Post => self.posts.clear(&id),
            EntityKind::Comment => self.comments.clear(&id),
        }
    }

    /// Seal the collecting batch of every loader.
    pub fn clear_all(&self) {
        self.users.clear_all();
        self.posts.clear_all();
        self.comments.clear_all();
    }
}
