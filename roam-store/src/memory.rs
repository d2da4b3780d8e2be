//! In-memory store implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::store::{KeyValueStore, StoreResult};

/// In-memory key-value store backed by a concurrent map.
///
/// Clones share the same underlying map. Data is not persisted across
/// process restarts; platform bindings wrap the device's own storage
/// behind the same [`KeyValueStore`] trait instead.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set_raw(&self, key: &str, value: String) -> StoreResult<()> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::KeyValueStoreExt;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Token {
        value: String,
    }

    #[tokio::test]
    async fn raw_round_trip() {
        let store = MemoryStore::new();
        store.set_raw("k", "v".to_owned()).await.unwrap();
        assert_eq!(store.get_raw("k").await.unwrap(), Some("v".to_owned()));
        store.remove("k").await.unwrap();
        assert_eq!(store.get_raw("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn json_round_trip() {
        let store = MemoryStore::new();
        let token = Token {
            value: "abc".to_owned(),
        };
        store.set_json("token", &token).await.unwrap();
        assert_eq!(store.get_json::<Token>("token").await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn corrupt_value_degrades_to_none() {
        let store = MemoryStore::new();
        store.set_raw("token", "{not json".to_owned()).await.unwrap();
        assert_eq!(store.get_json::<Token>("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let store = MemoryStore::new();
        store.set_raw("a", "1".to_owned()).await.unwrap();
        store.set_raw("b", "2".to_owned()).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = MemoryStore::new();
        let observer = store.clone();
        store.set_raw("k", "v".to_owned()).await.unwrap();
        assert_eq!(observer.get_raw("k").await.unwrap(), Some("v".to_owned()));
    }
}
