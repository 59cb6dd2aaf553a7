//! Outbound port to the storage layer.

use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Multi-key fetch for one entity type.
///
/// The result may be in any order and may omit keys (not found). It is called
/// once per dispatched batch with distinct keys.
#[async_trait]
pub trait BatchFetch: Send + Sync + 'static {
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    type Value: Clone + Send + Sync + 'static;

    async fn fetch(
        &self,
        keys: &[Self::Key],
    ) -> Result<HashMap<Self::Key, Self::Value>, FetchError>;
}
