//! Key-value data cache with recorded writes.
//!
//! Stores arbitrary values under generated keys. Every `store` call goes
//! through an [`Invoke`] strategy, so with the default [`CallRecorder`] the
//! history of writes can be replayed under the `Cache.store` identity.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use tally_core::constants::DATA_CACHE_STORE_IDENTITY;
use tally_core::error::{Result, TallyError};
use tally_core::traits::KeyValueStore;
use tally_core::types::{CallArgs, OperationId, ReplayReport};

use crate::invoke::Invoke;
use crate::recorder::CallRecorder;
use crate::replay::Replayer;

/// Data cache over a key-value store.
pub struct DataCache<S, I = CallRecorder<S>>
where
    S: KeyValueStore + ?Sized,
    I: Invoke,
{
    store: Arc<S>,
    invoker: I,
    store_op: OperationId,
}

impl<S: KeyValueStore + ?Sized + 'static> DataCache<S, CallRecorder<S>> {
    /// Creates a recording cache over an emptied store.
    ///
    /// The whole store is flushed first, history included.
    pub async fn new(store: Arc<S>) -> Result<Self> {
        store.flush().await?;
        Ok(Self::open(store))
    }

    /// Creates a recording cache over the store as it is.
    pub fn open(store: Arc<S>) -> Self {
        let recorder = CallRecorder::new(Arc::clone(&store));
        Self::with_invoker(store, recorder)
    }
}

impl<S, I> DataCache<S, I>
where
    S: KeyValueStore + ?Sized + 'static,
    I: Invoke,
{
    /// Creates a cache that runs `store` calls through `invoker`.
    pub fn with_invoker(store: Arc<S>, invoker: I) -> Self {
        Self {
            store,
            invoker,
            store_op: OperationId::from_static(DATA_CACHE_STORE_IDENTITY),
        }
    }

    /// Stores `data` under a fresh random key and returns the key.
    #[instrument(skip(self, data))]
    pub async fn store<D>(&self, data: D) -> Result<String>
    where
        D: fmt::Display + fmt::Debug,
    {
        let key = Uuid::new_v4().to_string();
        let args = CallArgs::new().arg(&data);
        let value = data.to_string();
        let store = Arc::clone(&self.store);

        let key = self
            .invoker
            .invoke(&self.store_op, &args, move || async move {
                store.set(&key, &value).await?;
                Ok::<_, TallyError>(key)
            })
            .await?;

        debug!(key = %key, "Stored value");
        Ok(key)
    }

    /// Reads the raw value under `key`.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.get(key).await
    }

    /// Reads the value under `key` and converts it with `convert`.
    pub async fn get_with<T, F>(&self, key: &str, convert: F) -> Result<Option<T>>
    where
        F: FnOnce(String) -> T,
    {
        Ok(self.store.get(key).await?.map(convert))
    }

    /// Reads the value under `key` as a string.
    pub async fn get_str(&self, key: &str) -> Result<Option<String>> {
        self.get_with(key, |raw| raw).await
    }

    /// Reads the value under `key` as an integer.
    pub async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.get_with(key, |raw| raw.trim().parse::<i64>().map_err(|e| (raw, e)))
            .await?
            .transpose()
            .map_err(|(raw, e)| TallyError::Decode {
                key: key.to_string(),
                reason: format!("'{}' is not an integer: {}", raw, e),
            })
    }

    /// History of `store` calls, when the store can be read.
    pub async fn replay_store(&self) -> Option<ReplayReport> {
        Replayer::new(Arc::clone(&self.store))
            .replay(&self.store_op)
            .await
    }

    /// Identity under which `store` calls are recorded.
    pub fn store_identity(&self) -> &OperationId {
        &self.store_op
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_store::MemoryStore;

    use crate::invoke::Direct;
    use crate::test_support::OfflineStore;

    #[tokio::test]
    async fn test_new_flushes_store() {
        let store = Arc::new(MemoryStore::new());
        store.set("stale", "1").await.unwrap();

        let _cache = DataCache::new(store.clone()).await.unwrap();
        assert!(!store.exists("stale").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let cache = DataCache::new(Arc::new(MemoryStore::new())).await.unwrap();

        let key = cache.store("hello").await.unwrap();
        assert!(Uuid::parse_str(&key).is_ok());
        assert_eq!(cache.get_str(&key).await.unwrap().as_deref(), Some("hello"));

        let key = cache.store(42).await.unwrap();
        assert_eq!(cache.get_int(&key).await.unwrap(), Some(42));
        assert_eq!(
            cache.get_with(&key, |raw| raw.len()).await.unwrap(),
            Some(2)
        );

        assert_eq!(cache.get("missing").await.unwrap(), None);
        assert_eq!(cache.get_int("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_int_decode_error() {
        let cache = DataCache::new(Arc::new(MemoryStore::new())).await.unwrap();
        let key = cache.store("not a number").await.unwrap();
        assert!(matches!(
            cache.get_int(&key).await,
            Err(TallyError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_calls_are_recorded() {
        let cache = DataCache::new(Arc::new(MemoryStore::new())).await.unwrap();
        let first = cache.store("foo").await.unwrap();
        let second = cache.store(3).await.unwrap();

        let report = cache.replay_store().await.unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(
            report.to_string(),
            format!(
                "Cache.store was called 2 times:\nCache.store(\"foo\",) -> {}\nCache.store(3,) -> {}",
                first, second
            )
        );
    }

    #[tokio::test]
    async fn test_direct_invoker_records_nothing() {
        let store = Arc::new(MemoryStore::new());
        let cache = DataCache::with_invoker(store.clone(), Direct);

        let key = cache.store("quiet").await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("quiet"));
        assert!(!store.exists("Cache.store").await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_store_fails_on_offline_store() {
        let cache = DataCache::open(Arc::new(OfflineStore));
        let err = cache.store("x").await.unwrap_err();
        assert!(err.is_store_unavailable());
    }
}
