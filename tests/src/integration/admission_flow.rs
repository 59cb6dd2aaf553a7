//! # Admission Flow
//!
//! The admission controller over the in-memory counter store, including two
//! controllers sharing one store as two server processes would.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::ip;
    use ql_01_window_counter::{cleanup_task, CounterStore, InMemoryCounterStore};
    use ql_02_admission::{
        AdmissionConfig, AdmissionController, AdmissionRequest, QuotaRule, RejectionReason, Scope,
        ScopeQuota, Window,
    };
    use shared_types::OperationKind;
    use std::sync::Arc;
    use std::time::Duration;

    fn origin_limited(limit: u64) -> AdmissionConfig {
        AdmissionConfig {
            origin: ScopeQuota {
                short: Some(QuotaRule::per_second(limit)),
                long: None,
            },
            ..AdmissionConfig::default()
        }
    }

    fn read(last: u8) -> AdmissionRequest {
        AdmissionRequest::new(ip(last), OperationKind::Read)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fourth_operation_in_window_rejected() {
        let store = Arc::new(InMemoryCounterStore::new());
        let controller = AdmissionController::new(store, origin_limited(3));
        let scope = Scope::Origin(ip(4));

        for expected in 1..=3 {
            let admission = controller.check(&read(4)).await.unwrap();
            assert_eq!(admission.count_for(&scope, Window::Short), Some(expected));
        }

        let rejection = controller.check(&read(4)).await.unwrap_err();
        assert_eq!(rejection.scope, scope);
        assert_eq!(rejection.reason, RejectionReason::QuotaExceeded);
        assert_eq!(rejection.message(), "origin quota exceeded");
        assert_eq!(rejection.retry_after, Some(Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        let admission = controller.check(&read(4)).await.unwrap();
        assert_eq!(admission.count_for(&scope, Window::Short), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_store_enforces_quota_across_processes() {
        let store: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());
        let first = AdmissionController::new(store.clone(), origin_limited(4));
        let second = AdmissionController::new(store, origin_limited(4));

        for _ in 0..2 {
            first.check(&read(9)).await.unwrap();
            second.check(&read(9)).await.unwrap();
        }
        assert!(first.check(&read(9)).await.is_err());
        assert!(second.check(&read(9)).await.is_err());

        // Other origins keep their own budget.
        assert!(second.check(&read(10)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ban_overrides_remaining_quota_until_expiry() {
        let store = Arc::new(InMemoryCounterStore::new());
        let controller = AdmissionController::new(store, AdmissionConfig::default());

        controller.ban(ip(7), Duration::from_secs(30)).await.unwrap();
        let rejection = controller.check(&read(7)).await.unwrap_err();
        assert_eq!(rejection.reason, RejectionReason::Banned);
        assert!(rejection.retry_after.unwrap() <= Duration::from_secs(30));

        // Nothing was charged while banned.
        let usage = controller.usage(&Scope::Origin(ip(7))).await.unwrap();
        assert!(usage.iter().all(|u| u.current == 0));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(!controller.is_banned(ip(7)).await.unwrap());
        assert!(controller.check(&read(7)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_lifts_ban_and_clears_windows() {
        let store = Arc::new(InMemoryCounterStore::new());
        let controller = AdmissionController::new(store, origin_limited(1));

        controller.check(&read(5)).await.unwrap();
        controller.ban(ip(5), Duration::from_secs(3_600)).await.unwrap();
        assert!(controller.check(&read(5)).await.is_err());

        controller.reset(&Scope::Origin(ip(5))).await.unwrap();
        assert!(controller.check(&read(5)).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_never_exceed_limit() {
        let store = Arc::new(InMemoryCounterStore::new());
        let config = AdmissionConfig {
            origin: ScopeQuota {
                short: None,
                long: Some(QuotaRule::per_minute(25)),
            },
            ..AdmissionConfig::default()
        };
        let controller = Arc::new(AdmissionController::new(store, config));

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let controller = controller.clone();
                tokio::spawn(async move { controller.check(&read(1)).await.is_ok() })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 25);

        let stats = controller.stats();
        assert_eq!(stats.admitted, 25);
        assert_eq!(stats.rejected_quota, 75);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_purges_idle_scopes() {
        let store = Arc::new(InMemoryCounterStore::new());
        let controller = AdmissionController::new(store.clone(), AdmissionConfig::default());
        controller.check(&read(2)).await.unwrap();
        assert!(store.key_count() > 0);

        let cleaner = tokio::spawn(cleanup_task(store.clone(), Duration::from_secs(30)));
        // Longest default window is one minute, plus grace.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(store.key_count(), 0);
        cleaner.abort();
    }
}
