//! # Gateway Flow
//!
//! Whole operation lifecycle: configuration from TOML, admission and cost
//! gating, batched resolution, mutation events reaching subscribers.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{comment, ip, post, user, RecordingStorage};
    use async_trait::async_trait;
    use futures::future::join_all;
    use ql_01_window_counter::{CounterStore, InMemoryCounterStore, StoreError, WindowSnapshot};
    use ql_03_query_cost::{ArgValue, Field, QueryDocument, Selection, Variables};
    use ql_05_event_fanout::EventFilter;
    use ql_gateway::{codes, GatewayConfig, GatewayRejection, OperationOutcome, TrafficShaper};
    use serde_json::json;
    use shared_types::{
        DomainEvent, EntityId, EntityKind, IdentityId, OperationKind, RequestContext,
    };
    use std::sync::Arc;
    use std::time::Duration;

    const CONFIG: &str = r#"
        [admission.origin]
        short = { limit = 5, window = "1s" }

        [admission.resources.feed]
        short = { limit = 2, window = "10s" }

        [cost]
        max_complexity = 200
        max_depth = 4
        expensive_fields = ["feed"]

        [loader]
        max_batch_size = 50
        batch_wait = "5ms"

        [fanout]
        queue_capacity = 16
    "#;

    fn shaper() -> TrafficShaper {
        let config = GatewayConfig::parse(CONFIG).unwrap();
        TrafficShaper::from_config(Arc::new(InMemoryCounterStore::new()), &config)
    }

    fn feed_query() -> QueryDocument {
        QueryDocument::query(vec![Field::new("feed")
            .arg("first", ArgValue::Variable("count".into()))
            .select(vec![
                Selection::field("title"),
                Field::new("author")
                    .select(vec![Selection::field("username")])
                    .into(),
            ])
            .into()])
    }

    fn vars(count: u64) -> Variables {
        let mut vars = Variables::new();
        vars.insert("count".into(), json!(count));
        vars
    }

    /// Counter store that is always unreachable.
    struct DownStore;

    #[async_trait]
    impl CounterStore for DownStore {
        async fn increment_and_count(&self, _: &str, _: Duration) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn acquire(&self, _: &str, _: Duration, _: u64) -> Result<WindowSnapshot, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn count(&self, _: &str, _: Duration) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn expire(&self, _: &str, _: Duration) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn exists(&self, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn set(&self, _: &str, _: Duration) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn ttl(&self, _: &str) -> Result<Option<Duration>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_operation_lifecycle() {
        let shaper = shaper();
        let mut storage = RecordingStorage::new();
        for id in 1..=3 {
            storage = storage.with(user(id));
        }
        for id in 1..=10 {
            storage = storage.with(post(id, id % 3 + 1));
        }
        let storage = Arc::new(storage);

        let ctx = RequestContext::authenticated(ip(1), IdentityId::new("reader"), OperationKind::Read);
        let permit = shaper
            .begin_operation(&ctx, &feed_query(), &vars(10))
            .await
            .unwrap();
        assert_eq!(permit.cost.expensive_fields, vec!["feed".to_string()]);
        assert_eq!(permit.cost.depth, 3);

        // Resolvers: the feed, then every post's author concurrently.
        let loaders = shaper.loaders(storage.clone());
        let ids: Vec<EntityId> = (1..=10).map(EntityId).collect();
        let posts: Vec<_> = loaders
            .posts
            .load_many(&ids)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();
        let authors = join_all(posts.iter().map(|p| loaders.users.load(p.author_id))).await;
        assert!(authors.iter().all(|a| matches!(a, Ok(Some(_)))));
        assert_eq!(storage.calls_for(EntityKind::User).len(), 1);
        assert_eq!(storage.calls_for(EntityKind::User)[0].len(), 3);

        tokio::time::advance(Duration::from_millis(12)).await;
        let elapsed = shaper.end_operation(permit, OperationOutcome::Success);
        assert!(elapsed >= Duration::from_millis(12));

        let metrics = shaper.metrics();
        assert_eq!(metrics.operations_success, 1);
        assert_eq!(metrics.in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_over_budget_query_resolves_nothing() {
        let shaper = shaper();
        let storage = Arc::new(RecordingStorage::new().with(user(1)));
        let ctx = RequestContext::anonymous(ip(2), OperationKind::Read);

        // first: 5000 adds 500 points, well above the 200 ceiling.
        let result = shaper.begin_operation(&ctx, &feed_query(), &vars(5_000)).await;
        let rejection = result.unwrap_err();
        assert!(matches!(rejection, GatewayRejection::Cost(_)));

        let payload = rejection.to_payload();
        assert_eq!(payload.code, codes::LIMIT_EXCEEDED);
        assert_eq!(payload.data.unwrap()["ceiling"], "max_complexity");

        // The handler never builds loaders for a rejected operation.
        assert!(storage.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expensive_field_quota_tighter_than_origin() {
        let shaper = shaper();
        let ctx = RequestContext::anonymous(ip(3), OperationKind::Read);

        for _ in 0..2 {
            let permit = shaper
                .begin_operation(&ctx, &feed_query(), &vars(5))
                .await
                .unwrap();
            shaper.end_operation(permit, OperationOutcome::Success);
        }

        let rejection = shaper
            .begin_operation(&ctx, &feed_query(), &vars(5))
            .await
            .unwrap_err();
        let payload = rejection.to_payload();
        assert_eq!(payload.code, codes::RATE_LIMITED);
        assert_eq!(payload.message, "resource quota exceeded");
        let data = payload.data.unwrap();
        assert_eq!(data["scope"], "resource:feed");
        assert_eq!(data["retry_after_ms"], 10_000);

        // A query without the expensive field still fits the origin quota.
        let cheap = QueryDocument::query(vec![Selection::field("viewer")]);
        assert!(shaper.begin_operation(&ctx, &cheap, &Variables::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_mutation_event_reaches_comment_subscribers() {
        let shaper = shaper();
        let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel::<()>();
        let mut on_post_1 = shaper
            .subscribe(EventFilter::children_of(EntityId(1)), async move {
                let _ = cancel_rx.await;
            })
            .unwrap();
        let mut on_post_2 = shaper
            .subscribe(EventFilter::children_of(EntityId(2)), std::future::pending())
            .unwrap();

        let report = shaper.publish(DomainEvent::child_created(EntityId(1), comment(7, 1, 3)));
        assert_eq!(report.matched, 1);

        let event = on_post_1.recv().await.unwrap();
        assert_eq!(event.parent_id(), Some(EntityId(1)));
        assert_eq!(on_post_2.try_recv().unwrap(), None);

        cancel_tx.send(()).unwrap();
        for _ in 0..100 {
            if shaper.active_subscriber_count() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(shaper.active_subscriber_count(), 1);
        assert_eq!(shaper.shutdown(), 1);
    }

    #[tokio::test]
    async fn test_store_outage_follows_failure_policy() {
        let closed = TrafficShaper::from_config(Arc::new(DownStore), &GatewayConfig::default());
        let ctx = RequestContext::anonymous(ip(4), OperationKind::Read);
        let doc = QueryDocument::query(vec![Selection::field("viewer")]);

        let rejection = closed
            .begin_operation(&ctx, &doc, &Variables::new())
            .await
            .unwrap_err();
        assert_eq!(rejection.code(), codes::RESOURCE_UNAVAILABLE);
        assert_eq!(closed.metrics().rejected_unavailable, 1);

        let open_config =
            GatewayConfig::parse("[admission]\nfailure_policy = \"fail_open\"").unwrap();
        let open = TrafficShaper::from_config(Arc::new(DownStore), &open_config);
        let permit = open
            .begin_operation(&ctx, &doc, &Variables::new())
            .await
            .unwrap();
        assert!(permit.admission.degraded);
    }
}
