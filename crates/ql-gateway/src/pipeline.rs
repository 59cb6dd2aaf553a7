//! Per-operation traffic pipeline.

use crate::config::GatewayConfig;
use crate::error::GatewayRejection;
use crate::loaders::{Loaders, Storage};
use crate::metrics::{GatewayMetrics, GatewayMetricsSnapshot};
use ql_01_window_counter::CounterStore;
use ql_02_admission::{Admission, AdmissionController, AdmissionRequest};
use ql_03_query_cost::{CostReport, QueryCostEstimator, QueryDocument, Variables};
use ql_04_entity_loader::LoaderConfig;
use ql_05_event_fanout::{EventFilter, FanoutManager, PublishReport, SubscribeError, Subscription};
use shared_types::{DomainEvent, OperationKind, RequestContext, RequestId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Proof that an operation passed admission and cost checks.
///
/// Hand it back to [`TrafficShaper::end_operation`] when execution finishes.
#[derive(Debug)]
pub struct OperationPermit {
    pub request_id: RequestId,
    pub kind: OperationKind,
    pub cost: CostReport,
    pub admission: Admission,
    started: Instant,
}

impl OperationPermit {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    Success,
    Failed,
}

/// Traffic shaping in front of the execution engine.
///
/// One instance per server process, shared by every handler.
pub struct TrafficShaper {
    admission: Arc<AdmissionController>,
    estimator: QueryCostEstimator,
    fanout: FanoutManager,
    loader_config: LoaderConfig,
    metrics: GatewayMetrics,
}

impl TrafficShaper {
    pub fn new(
        admission: Arc<AdmissionController>,
        estimator: QueryCostEstimator,
        fanout: FanoutManager,
        loader_config: LoaderConfig,
    ) -> Self {
        Self {
            admission,
            estimator,
            fanout,
            loader_config,
            metrics: GatewayMetrics::new(),
        }
    }

    /// Build every component from configuration over a shared counter store.
    pub fn from_config(store: Arc<dyn CounterStore>, config: &GatewayConfig) -> Self {
        Self::new(
            Arc::new(AdmissionController::new(store, config.admission.clone())),
            QueryCostEstimator::new(config.cost.clone()),
            FanoutManager::new(config.fanout),
            config.loader,
        )
    }

    /// Gate one operation before any field resolves.
    ///
    /// The cost is estimated first (no I/O), then admission charges every
    /// scope including the expensive fields the operation selects, then the
    /// cost ceilings are enforced. An operation rejected on cost has still
    /// been charged against its quotas.
    pub async fn begin_operation(
        &self,
        ctx: &RequestContext,
        doc: &QueryDocument,
        variables: &Variables,
    ) -> Result<OperationPermit, GatewayRejection> {
        let cost = self.estimator.estimate(doc, variables);

        // A mutation document is charged as a write whatever the context says.
        let kind = if doc.operation.operation_type.kind().is_write() {
            OperationKind::Write
        } else {
            ctx.kind
        };
        let mut request = AdmissionRequest::from(ctx);
        request.kind = kind;
        request.resources = cost.expensive_fields.clone();

        let admission = match self.admission.check(&request).await {
            Ok(admission) => admission,
            Err(rejection) => return Err(self.reject(ctx, rejection.into())),
        };

        if let Err(rejection) = self.estimator.check(&cost) {
            return Err(self.reject(ctx, rejection.into()));
        }

        self.metrics.record_start(kind.is_write());
        debug!(
            request_id = %ctx.request_id,
            kind = %kind,
            score = cost.score,
            depth = cost.depth,
            degraded = admission.degraded,
            "Operation admitted"
        );

        Ok(OperationPermit {
            request_id: ctx.request_id,
            kind,
            cost,
            admission,
            started: Instant::now(),
        })
    }

    /// Record how an admitted operation ended. Returns its duration.
    pub fn end_operation(&self, permit: OperationPermit, outcome: OperationOutcome) -> Duration {
        let elapsed = permit.elapsed();
        self.metrics
            .record_end(outcome == OperationOutcome::Success, elapsed.as_millis() as u64);
        debug!(
            request_id = %permit.request_id,
            outcome = ?outcome,
            elapsed_ms = elapsed.as_millis() as u64,
            "Operation finished"
        );
        elapsed
    }

    fn reject(&self, ctx: &RequestContext, rejection: GatewayRejection) -> GatewayRejection {
        self.metrics.record_rejection(&rejection);
        warn!(
            request_id = %ctx.request_id,
            origin = %ctx.origin,
            code = rejection.code(),
            reason = rejection.reason(),
            "Operation rejected: {}",
            rejection
        );
        rejection
    }

    /// Fresh loaders for one operation.
    pub fn loaders<S: Storage>(&self, storage: Arc<S>) -> Loaders<S> {
        Loaders::new(storage, self.loader_config)
    }

    /// Register a subscription resolver's event stream.
    pub fn subscribe<C>(
        &self,
        filter: EventFilter,
        cancel: C,
    ) -> Result<Subscription, SubscribeError>
    where
        C: Future<Output = ()> + Send + 'static,
    {
        self.fanout.subscribe(filter.into_predicate(), cancel)
    }

    /// Fan a committed change out to subscribers. Never blocks.
    pub fn publish(&self, event: DomainEvent) -> PublishReport {
        let report = self.fanout.publish(event);
        self.metrics.record_publish(report.delivered, report.dropped);
        report
    }

    pub fn active_subscriber_count(&self) -> usize {
        self.fanout.active_subscriber_count()
    }

    /// Close every subscription; used on graceful shutdown.
    pub fn shutdown(&self) -> usize {
        self.fanout.shutdown()
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    pub fn estimator(&self) -> &QueryCostEstimator {
        &self.estimator
    }

    pub fn fanout(&self) -> &FanoutManager {
        &self.fanout
    }

    pub fn metrics(&self) -> GatewayMetricsSnapshot {
        self.metrics.snapshot()
    }
}
