//! # Core Domain Entities
//!
//! The three stored entity types of the content-sharing application.
//!
//! ## Clusters
//!
//! - **Accounts**: `User`
//! - **Content**: `Post`, `Comment` (a comment is a child of a post)

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage identifier of any entity.
///
/// Identifiers are unique per entity kind, not globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(EntityId)
            .map_err(|_| ParseError::InvalidEntityId(s.to_string()))
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Discriminant of the stored entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Post,
    Comment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Post => "post",
            EntityKind::Comment => "comment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(EntityKind::User),
            "post" => Ok(EntityKind::Post),
            "comment" => Ok(EntityKind::Comment),
            _ => Err(ParseError::InvalidEntityKind(s.to_string())),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    /// Unix timestamp (milliseconds).
    pub created_at: u64,
}

/// A published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: EntityId,
    pub author_id: EntityId,
    pub title: String,
    pub body: String,
    pub published: bool,
    /// Unix timestamp (milliseconds).
    pub created_at: u64,
    /// Unix timestamp (milliseconds).
    pub updated_at: u64,
}

/// A comment attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: EntityId,
    pub post_id: EntityId,
    pub author_id: EntityId,
    pub body: String,
    /// Unix timestamp (milliseconds).
    pub created_at: u64,
}

/// Any stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    User(User),
    Post(Post),
    Comment(Comment),
}

impl Entity {
    /// Identifier of the wrapped entity.
    pub fn id(&self) -> EntityId {
        match self {
            Entity::User(u) => u.id,
            Entity::Post(p) => p.id,
            Entity::Comment(c) => c.id,
        }
    }

    /// Kind of the wrapped entity.
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::User(_) => EntityKind::User,
            Entity::Post(_) => EntityKind::Post,
            Entity::Comment(_) => EntityKind::Comment,
        }
    }

    /// Identifier of the owning parent, for entities that have one.
    pub fn parent_id(&self) -> Option<EntityId> {
        match self {
            Entity::Comment(c) => Some(c.post_id),
            Entity::User(_) | Entity::Post(_) => None,
        }
    }
}

impl From<User> for Entity {
    fn from(user: User) -> Self {
        Entity::User(user)
    }
}

impl From<Post> for Entity {
    fn from(post: Post) -> Self {
        Entity::Post(post)
    }
}

impl From<Comment> for Entity {
    fn from(comment: Comment) -> Self {
        Entity::Comment(comment)
    }
}
