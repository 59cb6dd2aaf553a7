//! Operation counters for the traffic pipeline.

use crate::error::GatewayRejection;
use ql_02_admission::RejectionReason;
use std::sync::atomic::{AtomicU64, Ordering};

/// Gateway-level metrics
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    // Operation counters
    pub operations_started: AtomicU64,
    pub operations_success: AtomicU64,
    pub operations_error: AtomicU64,
    pub write_operations_total: AtomicU64,

    // Operations admitted and not yet ended
    pub in_flight: AtomicU64,

    // Rejections
    pub rejected_rate_limited: AtomicU64,
    pub rejected_unavailable: AtomicU64,
    pub rejected_cost: AtomicU64,

    // Event delivery
    pub events_published: AtomicU64,
    pub events_delivered: AtomicU64,
    pub events_dropped: AtomicU64,

    // Latency tracking
    pub total_latency_ms: AtomicU64,
    pub latency_samples: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operation admitted past every check.
    pub fn record_start(&self, is_write: bool) {
        self.operations_started.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if is_write {
            self.write_operations_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the end of an admitted operation
    pub fn record_end(&self, success: bool, latency_ms: u64) {
        if success {
            self.operations_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.operations_error.fetch_add(1, Ordering::Relaxed);
        }
        // Saturate rather than wrap if ends outnumber starts.
        let _ = self
            .in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));

        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, rejection: &GatewayRejection) {
        let counter = match rejection {
            GatewayRejection::Admission(r) => match r.reason {
                RejectionReason::Banned | RejectionReason::QuotaExceeded => {
                    &self.rejected_rate_limited
                }
                RejectionReason::StoreUnavailable => &self.rejected_unavailable,
            },
            GatewayRejection::Cost(_) => &self.rejected_cost,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish(&self, delivered: usize, dropped: usize) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        self.events_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.events_dropped
            .fetch_add(dropped as u64, Ordering::Relaxed);
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.latency_samples.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    pub fn snapshot(&self) -> GatewayMetricsSnapshot {
        GatewayMetricsSnapshot {
            operations_started: self.operations_started.load(Ordering::Relaxed),
            operations_success: self.operations_success.load(Ordering::Relaxed),
            operations_error: self.operations_error.load(Ordering::Relaxed),
            write_operations_total: self.write_operations_total.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            rejected_rate_limited: self.rejected_rate_limited.load(Ordering::Relaxed),
            rejected_unavailable: self.rejected_unavailable.load(Ordering::Relaxed),
            rejected_cost: self.rejected_cost.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            average_latency_ms: self.average_latency_ms(),
        }
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        let s = self.snapshot();
        serde_json::json!({
            "operations": {
                "started": s.operations_started,
                "success": s.operations_success,
                "error": s.operations_error,
                "writes": s.write_operations_total,
                "in_flight": s.in_flight,
            },
            "rejections": {
                "rate_limited": s.rejected_rate_limited,
                "unavailable": s.rejected_unavailable,
                "cost": s.rejected_cost,
            },
            "events": {
                "published": s.events_published,
                "delivered": s.events_delivered,
                "dropped": s.events_dropped,
            },
            "latency": {
                "average_ms": s.average_latency_ms,
            }
        })
    }
}

/// Point-in-time copy of [`GatewayMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GatewayMetricsSnapshot {
    pub operations_started: u64,
    pub operations_success: u64,
    pub operations_error: u64,
    pub write_operations_total: u64,
    pub in_flight: u64,
    pub rejected_rate_limited: u64,
    pub rejected_unavailable: u64,
    pub rejected_cost: u64,
    pub events_published: u64,
    pub events_delivered: u64,
    pub events_dropped: u64,
    pub average_latency_ms: f64,
}

impl GatewayMetricsSnapshot {
    pub fn rejected(&self) -> u64 {
        self.rejected_rate_limited + self.rejected_unavailable + self.rejected_cost
    }
}
