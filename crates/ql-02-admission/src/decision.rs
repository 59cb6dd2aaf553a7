//! Outcomes of an admission check.

use crate::scope::{Scope, Window};
use std::fmt;
use std::time::Duration;

/// One scope window charged by an admitted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargedScope {
    pub scope: Scope,
    pub window: Window,
    /// Count in the window after this operation.
    pub count: u64,
    pub limit: u64,
}

/// The operation may proceed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Admission {
    /// Scopes charged, in evaluation order.
    pub charged: Vec<ChargedScope>,
    /// True when a store failure was tolerated under the fail-open policy.
    pub degraded: bool,
}

impl Admission {
    /// Count recorded for a scope window, if it was charged.
    pub fn count_for(&self, scope: &Scope, window: Window) -> Option<u64> {
        self.charged
            .iter()
            .find(|c| &c.scope == scope && c.window == window)
            .map(|c| c.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// The origin is banned.
    Banned,
    /// A quota window is full.
    QuotaExceeded,
    /// The counter store failed and the policy is fail-closed.
    StoreUnavailable,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::Banned => "banned",
            RejectionReason::QuotaExceeded => "quota_exceeded",
            RejectionReason::StoreUnavailable => "store_unavailable",
        }
    }
}

/// The operation may not proceed.
///
/// Carries the scope that failed so well-behaved clients can back off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub scope: Scope,
    pub window: Option<Window>,
    pub reason: RejectionReason,
    pub limit: Option<u64>,
    pub retry_after: Option<Duration>,
}

impl Rejection {
    pub fn banned(scope: Scope, remaining: Option<Duration>) -> Self {
        Self {
            scope,
            window: None,
            reason: RejectionReason::Banned,
            limit: None,
            retry_after: remaining,
        }
    }

    pub fn quota_exceeded(scope: Scope, window: Window, limit: u64, retry_after: Duration) -> Self {
        Self {
            scope,
            window: Some(window),
            reason: RejectionReason::QuotaExceeded,
            limit: Some(limit),
            retry_after: Some(retry_after),
        }
    }

    pub fn unavailable(scope: Scope, window: Option<Window>) -> Self {
        Self {
            scope,
            window,
            reason: RejectionReason::StoreUnavailable,
            limit: None,
            retry_after: None,
        }
    }

    /// Human-readable reason, e.g. `origin quota exceeded`.
    pub fn message(&self) -> String {
        match self.reason {
            RejectionReason::Banned => "origin banned".to_string(),
            RejectionReason::QuotaExceeded => format!("{} quota exceeded", self.scope.label()),
            RejectionReason::StoreUnavailable => "rate limit store unavailable".to_string(),
        }
    }

    /// Whether retrying later can succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.reason, RejectionReason::Banned) || self.retry_after.is_some()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.scope)?;
        if let Some(retry_after) = self.retry_after {
            write!(f, ", retry after {}ms", retry_after.as_millis())?;
        }
        Ok(())
    }
}

impl std::error::Error for Rejection {}

/// Current usage of one scope window, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeUsage {
    pub window: Window,
    pub window_length: Duration,
    pub current: u64,
    pub limit: u64,
    pub remaining: u64,
}
