//! Common traits for tally.
//!
//! These are the two external seams of the system: the key-value store that
//! holds counters and logs, and the fetcher that retrieves remote resources.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// KEY-VALUE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Capability contract every backing store must satisfy.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - Redis (for sharing history between processes)
///
/// Atomicity of `incr` and `rpush` is the only ordering primitive the
/// recorder relies on. Methods that need a live backend return
/// [`TallyError::StoreUnavailable`](crate::TallyError::StoreUnavailable)
/// when it cannot be reached.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Atomically increments the integer at `key`, creating it at 1.
    ///
    /// An existing time-to-live on the key is preserved.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Atomically appends `value` to the list at `key`, creating the list.
    ///
    /// Returns the list length after the append.
    async fn rpush(&self, key: &str, value: &str) -> Result<usize>;

    /// Reads the inclusive range `start..=stop` of the list at `key`.
    ///
    /// Negative indices count from the end, so `(0, -1)` is the whole list.
    /// A missing key reads as an empty list.
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// Reads the scalar value at `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites `key` with `value`, expiring it after `ttl`.
    ///
    /// Every call resets the expiry.
    async fn setex(&self, key: &str, ttl: Duration, value: &str) -> Result<()>;

    /// Overwrites `key` with `value` and clears any expiry.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Returns true if `key` holds a live value of any type.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Removes every key.
    async fn flush(&self) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// FETCHER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for retrieving the text content of a remote resource.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `resource` and returns its body.
    ///
    /// Transport failures and non-success responses are errors.
    async fn fetch(&self, resource: &str) -> Result<String>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn incr(&self, key: &str) -> Result<i64> {
        (**self).incr(key).await
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<usize> {
        (**self).rpush(key, value).await
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        (**self).lrange(key, start, stop).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn setex(&self, key: &str, ttl: Duration, value: &str) -> Result<()> {
        (**self).setex(key, ttl, value).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key).await
    }

    async fn flush(&self) -> Result<()> {
        (**self).flush().await
    }
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    async fn fetch(&self, resource: &str) -> Result<String> {
        (**self).fetch(resource).await
    }
}
