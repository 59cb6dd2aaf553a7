//! Admission counters.

use crate::decision::RejectionReason;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals of admission decisions.
#[derive(Debug, Default)]
pub struct AdmissionStats {
    /// Checks evaluated
    pub checks: AtomicU64,
    /// Operations admitted
    pub admitted: AtomicU64,
    /// Rejected because of a ban
    pub rejected_banned: AtomicU64,
    /// Rejected because a quota window was full
    pub rejected_quota: AtomicU64,
    /// Rejected because the counter store failed
    pub rejected_unavailable: AtomicU64,
    /// Admitted despite a store failure (fail-open)
    pub degraded: AtomicU64,
}

impl AdmissionStats {
    pub(crate) fn record_rejection(&self, reason: RejectionReason) {
        let counter = match reason {
            RejectionReason::Banned => &self.rejected_banned,
            RejectionReason::QuotaExceeded => &self.rejected_quota,
            RejectionReason::StoreUnavailable => &self.rejected_unavailable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AdmissionStatsSnapshot {
        AdmissionStatsSnapshot {
            checks: self.checks.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            rejected_banned: self.rejected_banned.load(Ordering::Relaxed),
            rejected_quota: self.rejected_quota.load(Ordering::Relaxed),
            rejected_unavailable: self.rejected_unavailable.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`AdmissionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdmissionStatsSnapshot {
    pub checks: u64,
    pub admitted: u64,
    pub rejected_banned: u64,
    pub rejected_quota: u64,
    pub rejected_unavailable: u64,
    pub degraded: u64,
}

impl AdmissionStatsSnapshot {
    pub fn rejected(&self) -> u64 {
        self.rejected_banned + self.rejected_quota + self.rejected_unavailable
    }
}
