//! # Request Context
//!
//! Per-operation facts supplied by the request pipeline: who is asking, from
//! where, and whether the operation reads or writes.

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use uuid::Uuid;

/// Request ID for tracking one operation through every component.
///
/// Uses UUID v7 which is time-ordered, so log lines sort by arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new request ID (UUID v7)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse from string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque authenticated identity produced by the credential subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub String);

impl IdentityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an operation only reads or also mutates state.
///
/// Queries and subscriptions are reads; mutations are writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Read,
    Write,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, OperationKind::Write)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" | "query" | "subscription" => Ok(OperationKind::Read),
            "write" | "mutation" => Ok(OperationKind::Write),
            _ => Err(ParseError::InvalidOperationKind(s.to_string())),
        }
    }
}

/// Everything the traffic layer knows about the caller of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: RequestId,
    /// Client origin address (already resolved through trusted proxies).
    pub origin: IpAddr,
    /// Authenticated identity, if the request carried valid credentials.
    pub identity: Option<IdentityId>,
    pub kind: OperationKind,
}

impl RequestContext {
    /// Anonymous context for an origin.
    pub fn anonymous(origin: IpAddr, kind: OperationKind) -> Self {
        Self {
            request_id: RequestId::new(),
            origin,
            identity: None,
            kind,
        }
    }

    /// Context for an authenticated caller.
    pub fn authenticated(origin: IpAddr, identity: IdentityId, kind: OperationKind) -> Self {
        Self {
            request_id: RequestId::new(),
            origin,
            identity: Some(identity),
            kind,
        }
    }
}
