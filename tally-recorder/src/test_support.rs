//! Shared test doubles.

use std::time::Duration;

use async_trait::async_trait;

use tally_core::error::{Result, TallyError};
use tally_core::traits::KeyValueStore;

/// Store whose backend is never reachable.
pub(crate) struct OfflineStore;

fn offline<T>() -> Result<T> {
    Err(TallyError::StoreUnavailable("connection refused".into()))
}

#[async_trait]
impl KeyValueStore for OfflineStore {
    async fn incr(&self, _key: &str) -> Result<i64> {
        offline()
    }

    async fn rpush(&self, _key: &str, _value: &str) -> Result<usize> {
        offline()
    }

    async fn lrange(&self, _key: &str, _start: isize, _stop: isize) -> Result<Vec<String>> {
        offline()
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        offline()
    }

    async fn setex(&self, _key: &str, _ttl: Duration, _value: &str) -> Result<()> {
        offline()
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        offline()
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        offline()
    }

    async fn flush(&self) -> Result<()> {
        offline()
    }
}
