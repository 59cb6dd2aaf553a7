//! Rate-limit scopes and their counter keys.

use crate::error::AdmissionError;
use shared_types::{IdentityId, OperationKind};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// A named dimension of rate limiting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Origin(IpAddr),
    Identity(IdentityId),
    Operation(OperationKind),
    /// An expensive field flagged by the cost estimator.
    Resource(String),
}

impl Scope {
    /// Scope family name, used in rejection messages and metrics labels.
    pub fn label(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Origin(_) => "origin",
            Scope::Identity(_) => "identity",
            Scope::Operation(_) => "operation",
            Scope::Resource(_) => "resource",
        }
    }

    /// Counter-store key for one of this scope's windows.
    pub fn counter_key(&self, window: Window) -> String {
        format!("rl:{self}:{window}")
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Origin(ip) => write!(f, "origin:{ip}"),
            Scope::Identity(id) => write!(f, "identity:{id}"),
            Scope::Operation(kind) => write!(f, "operation:{kind}"),
            Scope::Resource(tag) => write!(f, "resource:{tag}"),
        }
    }
}

impl FromStr for Scope {
    type Err = AdmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "global" {
            return Ok(Scope::Global);
        }
        let invalid = || AdmissionError::InvalidScope(s.to_string());
        let (family, value) = s.split_once(':').ok_or_else(invalid)?;
        if value.is_empty() {
            return Err(invalid());
        }
        match family {
            "origin" => value.parse().map(Scope::Origin).map_err(|_| invalid()),
            "identity" => Ok(Scope::Identity(IdentityId::new(value))),
            "operation" => value.parse().map(Scope::Operation).map_err(|_| invalid()),
            "resource" => Ok(Scope::Resource(value.to_string())),
            _ => Err(invalid()),
        }
    }
}

/// Which of a scope's two windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Short,
    Long,
}

impl Window {
    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Short => "short",
            Window::Long => "long",
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter-store key marking a banned origin.
pub fn ban_key(origin: IpAddr) -> String {
    format!("ban:{origin}")
}
