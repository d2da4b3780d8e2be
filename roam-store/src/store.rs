//! The key-value store trait and its JSON extension methods.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::StoreError;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Asynchronous key-value storage over string keys and JSON string values.
///
/// Implementations only move strings; (de)serialization lives in
/// [`KeyValueStoreExt`] so every backend shares the same JSON and
/// corruption-handling semantics.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the raw value stored under `key`, if any.
    async fn get_raw(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn set_raw(&self, key: &str, value: String) -> StoreResult<()>;

    /// Removes the value stored under `key`, if any.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Removes every stored value.
    async fn clear(&self) -> StoreResult<()>;
}

#[async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_raw(key).await
    }

    async fn set_raw(&self, key: &str, value: String) -> StoreResult<()> {
        (**self).set_raw(key, value).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (**self).clear().await
    }
}

#[async_trait]
impl KeyValueStore for Box<dyn KeyValueStore> {
    async fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_raw(key).await
    }

    async fn set_raw(&self, key: &str, value: String) -> StoreResult<()> {
        (**self).set_raw(key, value).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (**self).clear().await
    }
}

/// Typed JSON operations layered over the raw string contract.
#[async_trait]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Reads and deserializes the value under `key`.
    ///
    /// A stored value that fails to parse is treated as absent: the
    /// corruption is logged and `Ok(None)` is returned, never an error.
    async fn get_json<T>(&self, key: &str) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                tracing::warn!(
                    target: "roam::store",
                    key,
                    %error,
                    "stored value is not valid JSON, treating as absent",
                );
                Ok(None)
            }
        }
    }

    /// Serializes and writes `value` under `key`.
    async fn set_json<T>(&self, key: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + Sync,
    {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, raw).await
    }
}

#[async_trait]
impl<S> KeyValueStoreExt for S where S: KeyValueStore + ?Sized {}
