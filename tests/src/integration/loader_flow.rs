//! # Loader Flow
//!
//! Resolver-style concurrent loads through the gateway loaders against a
//! recording storage backend.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{comment, post, user, RecordingStorage};
    use futures::future::join_all;
    use ql_04_entity_loader::{FetchError, LoadError, LoaderConfig};
    use ql_gateway::Loaders;
    use rand::seq::SliceRandom;
    use shared_types::{EntityId, EntityKind};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    fn config(max_batch_size: usize) -> LoaderConfig {
        LoaderConfig {
            max_batch_size,
            batch_wait: Duration::from_millis(10),
        }
    }

    fn seeded(users: u64) -> RecordingStorage {
        (1..=users).fold(RecordingStorage::new(), |storage, id| storage.with(user(id)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_authors_resolved_in_one_batch() {
        // A feed of 20 posts by 5 authors resolves each author field.
        let mut storage = seeded(5);
        for id in 1..=20 {
            storage = storage.with(post(id, id % 5 + 1));
        }
        let storage = Arc::new(storage);
        let loaders = Loaders::new(storage.clone(), config(100));

        let posts: Vec<_> = join_all((1..=20).map(|id| loaders.posts.load(EntityId(id))))
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();
        let authors = join_all(posts.iter().map(|p| loaders.users.load(p.author_id))).await;

        for (post, author) in posts.iter().zip(&authors) {
            let author = author.as_ref().unwrap().as_ref().unwrap();
            assert_eq!(author.id, post.author_id);
        }

        let user_batches = storage.calls_for(EntityKind::User);
        assert_eq!(user_batches.len(), 1);
        assert_eq!(user_batches[0].len(), 5);
        assert_eq!(storage.calls_for(EntityKind::Post).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_fetched_once_regardless_of_call_count() {
        let storage = Arc::new(seeded(30));
        let loaders = Loaders::new(storage.clone(), config(100));

        let mut keys: Vec<EntityId> = (1..=30).chain(1..=30).chain(1..=10).map(EntityId).collect();
        keys.shuffle(&mut rand::thread_rng());

        let results = loaders.users.load_many(&keys).await;
        for (key, result) in keys.iter().zip(results) {
            assert_eq!(result.unwrap().unwrap().id, *key);
        }

        let batches = storage.calls_for(EntityKind::User);
        assert_eq!(batches.len(), 1);
        let distinct: HashSet<_> = batches[0].iter().collect();
        assert_eq!(batches[0].len(), 30);
        assert_eq!(distinct.len(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_splits_batches() {
        let storage = Arc::new(seeded(25));
        let loaders = Loaders::new(storage.clone(), config(10));

        let keys: Vec<EntityId> = (1..=25).map(EntityId).collect();
        let results = loaders.users.load_many(&keys).await;
        assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));

        let sizes: Vec<usize> = storage
            .calls_for(EntityKind::User)
            .iter()
            .map(Vec::len)
            .collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_comment_does_not_affect_siblings() {
        let storage = Arc::new(
            RecordingStorage::new()
                .with(comment(1, 1, 1))
                .with(comment(3, 1, 2)),
        );
        let loaders = Loaders::new(storage, config(100));

        let results = loaders
            .comments
            .load_many(&[EntityId(1), EntityId(2), EntityId(3)])
            .await;
        assert_eq!(results[0].as_ref().unwrap().as_ref().unwrap().body, "comment 1");
        assert!(results[1].as_ref().unwrap().is_none());
        assert_eq!(results[2].as_ref().unwrap().as_ref().unwrap().author_id, EntityId(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_storage_outage_fails_whole_batch_then_recovers() {
        let storage = Arc::new(seeded(3));
        storage.set_unavailable(true);
        let loaders = Loaders::new(storage.clone(), config(100));

        let results = loaders
            .users
            .load_many(&[EntityId(1), EntityId(2), EntityId(3)])
            .await;
        for result in &results {
            assert_eq!(
                result,
                &Err(LoadError::Fetch(FetchError::Unavailable(
                    "connection refused".into()
                )))
            );
        }

        // No retry inside the loader: the next load opens a new batch.
        storage.set_unavailable(false);
        let loaded = loaders.users.load(EntityId(2)).await.unwrap();
        assert_eq!(loaded.unwrap().username, "user2");
        assert_eq!(storage.calls_for(EntityKind::User).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_key_opens_fresh_batch() {
        let storage = Arc::new(seeded(2));
        let loaders = Arc::new(Loaders::new(storage.clone(), config(100)));

        let first = {
            let loaders = loaders.clone();
            tokio::spawn(async move { loaders.users.load(EntityId(1)).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(loaders.users.pending_keys(), 1);

        assert!(loaders.clear(EntityKind::User, EntityId(1)));
        let second = loaders.users.load(EntityId(1)).await.unwrap();

        assert_eq!(first.await.unwrap().unwrap().unwrap().id, EntityId(1));
        assert_eq!(second.unwrap().id, EntityId(1));
        assert_eq!(storage.calls_for(EntityKind::User).len(), 2);
    }
}
