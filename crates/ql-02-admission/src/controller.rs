//! The admission controller.

use crate::config::{AdmissionConfig, FailurePolicy};
use crate::decision::{Admission, ChargedScope, Rejection, ScopeUsage};
use crate::error::AdmissionError;
use crate::scope::{ban_key, Scope, Window};
use crate::stats::{AdmissionStats, AdmissionStatsSnapshot};
use ql_01_window_counter::{CounterStore, StoreError};
use shared_types::{IdentityId, OperationKind, RequestContext};
use std::collections::HashSet;
use std::future::Future;
use std::net::IpAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Inputs of one admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRequest {
    pub origin: IpAddr,
    pub identity: Option<IdentityId>,
    pub kind: OperationKind,
    /// Expensive-field tags selected by the operation.
    pub resources: Vec<String>,
}

impl AdmissionRequest {
    pub fn new(origin: IpAddr, kind: OperationKind) -> Self {
        Self {
            origin,
            identity: None,
            kind,
            resources: Vec::new(),
        }
    }

    pub fn with_identity(mut self, identity: IdentityId) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }
}

impl From<&RequestContext> for AdmissionRequest {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            origin: ctx.origin,
            identity: ctx.identity.clone(),
            kind: ctx.kind,
            resources: Vec::new(),
        }
    }
}

/// Multi-scope admission controller.
///
/// One instance serves the whole server and is shared behind an `Arc`;
/// tests build isolated instances over their own store.
pub struct AdmissionController {
    store: Arc<dyn CounterStore>,
    config: AdmissionConfig,
    exempt: HashSet<IpAddr>,
    stats: AdmissionStats,
}

impl AdmissionController {
    pub fn new(store: Arc<dyn CounterStore>, config: AdmissionConfig) -> Self {
        let exempt = config.exempt_origins.iter().copied().collect();
        Self {
            store,
            config,
            exempt,
            stats: AdmissionStats::default(),
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn stats(&self) -> AdmissionStatsSnapshot {
        self.stats.snapshot()
    }

    /// Decide whether an operation may proceed, charging every scope it passes.
    pub async fn check(&self, request: &AdmissionRequest) -> Result<Admission, Rejection> {
        self.stats.checks.fetch_add(1, Ordering::Relaxed);
        let result = self.evaluate(request).await;

        match &result {
            Ok(admission) => {
                self.stats.admitted.fetch_add(1, Ordering::Relaxed);
                if admission.degraded {
                    self.stats.degraded.fetch_add(1, Ordering::Relaxed);
                }
                debug!(
                    origin = %request.origin,
                    kind = %request.kind,
                    charged = admission.charged.len(),
                    degraded = admission.degraded,
                    "Operation admitted"
                );
            }
            Err(rejection) => {
                self.stats.record_rejection(rejection.reason);
                warn!(
                    origin = %request.origin,
                    scope = %rejection.scope,
                    reason = rejection.reason.as_str(),
                    retry_after_ms = rejection.retry_after.map(|d| d.as_millis() as u64),
                    "Operation rejected"
                );
            }
        }

        result
    }

    async fn evaluate(&self, request: &AdmissionRequest) -> Result<Admission, Rejection> {
        // One budget covers every store call of the check.
        let deadline = Instant::now() + self.config.store_timeout;
        let mut admission = Admission::default();
        let origin_scope = Scope::Origin(request.origin);
        let ban = ban_key(request.origin);

        match Self::within(deadline, self.store.exists(&ban)).await {
            Ok(true) => {
                let remaining = Self::within(deadline, self.store.ttl(&ban))
                    .await
                    .ok()
                    .flatten();
                return Err(Rejection::banned(origin_scope, remaining));
            }
            Ok(false) => {}
            Err(err) => self.tolerate(&origin_scope, None, err, &mut admission)?,
        }

        if !self.config.enabled || self.exempt.contains(&request.origin) {
            return Ok(admission);
        }

        for scope in self.scopes_for(request) {
            for (window, rule) in self.config.quota_for(&scope).rules() {
                let key = scope.counter_key(window);
                let acquired = self.store.acquire(&key, rule.window, rule.limit);
                match Self::within(deadline, acquired).await {
                    Ok(snapshot) if snapshot.admitted => admission.charged.push(ChargedScope {
                        scope: scope.clone(),
                        window,
                        count: snapshot.count,
                        limit: rule.limit,
                    }),
                    Ok(snapshot) => {
                        let retry_after = snapshot.retry_after.unwrap_or(rule.window);
                        return Err(Rejection::quota_exceeded(
                            scope,
                            window,
                            rule.limit,
                            retry_after,
                        ));
                    }
                    Err(err) => self.tolerate(&scope, Some(window), err, &mut admission)?,
                }
            }
        }

        Ok(admission)
    }

    /// Scopes to charge, in evaluation order. Resource tags are deduplicated.
    fn scopes_for(&self, request: &AdmissionRequest) -> Vec<Scope> {
        let mut scopes = vec![Scope::Global, Scope::Origin(request.origin)];
        if let Some(identity) = &request.identity {
            scopes.push(Scope::Identity(identity.clone()));
        }
        scopes.push(Scope::Operation(request.kind));

        let mut seen = HashSet::new();
        for tag in &request.resources {
            if seen.insert(tag.as_str()) {
                scopes.push(Scope::Resource(tag.clone()));
            }
        }
        scopes
    }

    /// Run a single admin store call within `store_timeout`.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        Self::within(Instant::now() + self.config.store_timeout, call).await
    }

    async fn within<T>(
        deadline: Instant,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout_at(deadline, call)
            .await
            .unwrap_or(Err(StoreError::Timeout))
    }

    /// Apply the failure policy. Timeouts always fail closed.
    fn tolerate(
        &self,
        scope: &Scope,
        window: Option<Window>,
        err: StoreError,
        admission: &mut Admission,
    ) -> Result<(), Rejection> {
        let fail_open =
            err != StoreError::Timeout && self.config.failure_policy == FailurePolicy::FailOpen;

        if fail_open {
            warn!(scope = %scope, error = %err, "Counter store failure tolerated, admitting");
            admission.degraded = true;
            Ok(())
        } else {
            warn!(scope = %scope, error = %err, "Counter store failure, rejecting");
            Err(Rejection::unavailable(scope.clone(), window))
        }
    }

    /// Clear a scope's counters. Resetting an origin also lifts its ban.
    pub async fn reset(&self, scope: &Scope) -> Result<(), AdmissionError> {
        for window in [Window::Short, Window::Long] {
            self.bounded(self.store.delete(&scope.counter_key(window)))
                .await?;
        }
        if let Scope::Origin(origin) = scope {
            self.bounded(self.store.delete(&ban_key(*origin))).await?;
        }
        info!(scope = %scope, "Admission scope reset");
        Ok(())
    }

    /// Reject every operation from `origin` for `duration`.
    pub async fn ban(&self, origin: IpAddr, duration: Duration) -> Result<(), AdmissionError> {
        self.bounded(self.store.set(&ban_key(origin), duration))
            .await?;
        info!(origin = %origin, duration_secs = duration.as_secs(), "Origin banned");
        Ok(())
    }

    /// Lift a ban. Returns false if the origin was not banned.
    pub async fn unban(&self, origin: IpAddr) -> Result<bool, AdmissionError> {
        let removed = self.bounded(self.store.delete(&ban_key(origin))).await?;
        if removed {
            info!(origin = %origin, "Origin unbanned");
        }
        Ok(removed)
    }

    pub async fn is_banned(&self, origin: IpAddr) -> Result<bool, AdmissionError> {
        Ok(self.bounded(self.store.exists(&ban_key(origin))).await?)
    }

    /// Remaining ban time, `None` if not banned.
    pub async fn ban_remaining(&self, origin: IpAddr) -> Result<Option<Duration>, AdmissionError> {
        Ok(self.bounded(self.store.ttl(&ban_key(origin))).await?)
    }

    /// Current usage versus limit of each configured window of a scope.
    pub async fn usage(&self, scope: &Scope) -> Result<Vec<ScopeUsage>, AdmissionError> {
        let mut usage = Vec::new();
        for (window, rule) in self.config.quota_for(scope).rules() {
            let current = self
                .bounded(self.store.count(&scope.counter_key(window), rule.window))
                .await?;
            usage.push(ScopeUsage {
                window,
                window_length: rule.window,
                current,
                limit: rule.limit,
                remaining: rule.limit.saturating_sub(current),
            });
        }
        Ok(usage)
    }
}
