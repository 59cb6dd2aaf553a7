//! Admission quotas and failure policy.

use crate::scope::{Scope, Window};
use serde::{Deserialize, Serialize};
use shared_types::OperationKind;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

/// At most `limit` operations per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRule {
    pub limit: u64,
    #[serde(with = "shared_types::duration_serde")]
    pub window: Duration,
}

impl QuotaRule {
    pub const fn new(limit: u64, window: Duration) -> Self {
        Self { limit, window }
    }

    pub const fn per_second(limit: u64) -> Self {
        Self::new(limit, Duration::from_secs(1))
    }

    pub const fn per_minute(limit: u64) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }
}

/// Short and long window rules of one scope. A missing rule is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeQuota {
    pub short: Option<QuotaRule>,
    pub long: Option<QuotaRule>,
}

impl ScopeQuota {
    pub const fn new(short: QuotaRule, long: QuotaRule) -> Self {
        Self {
            short: Some(short),
            long: Some(long),
        }
    }

    pub const fn unlimited() -> Self {
        Self {
            short: None,
            long: None,
        }
    }

    /// Configured rules, short window first.
    pub fn rules(&self) -> impl Iterator<Item = (Window, QuotaRule)> {
        [(Window::Short, self.short), (Window::Long, self.long)]
            .into_iter()
            .filter_map(|(window, rule)| rule.map(|rule| (window, rule)))
    }
}

/// What to do when the counter store fails with something other than a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Reject with a retryable "unavailable" rejection.
    #[default]
    FailClosed,
    /// Admit, log a warning and mark the admission degraded.
    FailOpen,
}

/// Admission controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// When false only bans are enforced
    pub enabled: bool,
    /// All operations, server-wide
    pub global: ScopeQuota,
    /// Per client address
    pub origin: ScopeQuota,
    /// Per authenticated identity
    pub identity: ScopeQuota,
    /// Queries and subscriptions
    pub read: ScopeQuota,
    /// Mutations (tighter than reads)
    pub write: ScopeQuota,
    /// Default quota for each expensive-field resource tag
    pub resource: ScopeQuota,
    /// Per-tag overrides of `resource`
    pub resources: HashMap<String, ScopeQuota>,
    /// Origins that skip quota checks (bans still apply)
    pub exempt_origins: Vec<IpAddr>,
    /// Non-timeout store failure handling
    pub failure_policy: FailurePolicy,
    /// Budget for all counter store calls of one admission check
    #[serde(with = "shared_types::duration_serde")]
    pub store_timeout: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global: ScopeQuota::new(QuotaRule::per_second(2_000), QuotaRule::per_minute(60_000)),
            origin: ScopeQuota::new(QuotaRule::per_second(20), QuotaRule::per_minute(600)),
            identity: ScopeQuota::new(QuotaRule::per_second(30), QuotaRule::per_minute(1_200)),
            read: ScopeQuota::new(QuotaRule::per_second(1_000), QuotaRule::per_minute(30_000)),
            write: ScopeQuota::new(QuotaRule::per_second(100), QuotaRule::per_minute(2_000)),
            resource: ScopeQuota::new(QuotaRule::per_second(10), QuotaRule::per_minute(200)),
            resources: HashMap::new(),
            exempt_origins: Vec::new(),
            failure_policy: FailurePolicy::FailClosed,
            store_timeout: Duration::from_millis(50),
        }
    }
}

impl AdmissionConfig {
    /// Quota applying to a scope.
    pub fn quota_for(&self, scope: &Scope) -> ScopeQuota {
        match scope {
            Scope::Global => self.global,
            Scope::Origin(_) => self.origin,
            Scope::Identity(_) => self.identity,
            Scope::Operation(OperationKind::Read) => self.read,
            Scope::Operation(OperationKind::Write) => self.write,
            Scope::Resource(tag) => self.resources.get(tag).copied().unwrap_or(self.resource),
        }
    }

    /// Every configured rule, labelled with where it lives, for validation.
    pub fn all_rules(&self) -> Vec<(String, QuotaRule)> {
        let mut named: Vec<(String, ScopeQuota)> = vec![
            ("global".into(), self.global),
            ("origin".into(), self.origin),
            ("identity".into(), self.identity),
            ("read".into(), self.read),
            ("write".into(), self.write),
            ("resource".into(), self.resource),
        ];
        named.extend(
            self.resources
                .iter()
                .map(|(tag, quota)| (format!("resources.{tag}"), *quota)),
        );

        named
            .into_iter()
            .flat_map(|(name, quota)| {
                quota
                    .rules()
                    .map(move |(window, rule)| (format!("{name}.{window}"), rule))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
