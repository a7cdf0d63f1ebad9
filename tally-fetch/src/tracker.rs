//! Access-tracked fetch cache.
//!
//! Each fetch of a resource bumps `count:{resource}` in the shared store and
//! refreshes its expiry, so the counter only lives while the resource keeps
//! being requested. Bodies are memoized in process; the counter sees every
//! request, the underlying fetcher only sees memo misses.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use tally_cache::{MemoCache, MemoConfig, MemoStats};
use tally_core::constants::{DEFAULT_ACCESS_TTL_SECONDS, DEFAULT_MEMO_CAPACITY};
use tally_core::error::{Result, TallyError};
use tally_core::traits::{Fetcher, KeyValueStore};
use tally_core::types::access_count_key;

/// Fetch cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchCacheConfig {
    /// Lifetime of an access counter after its last access, in seconds
    pub access_ttl_seconds: u64,
    /// Maximum number of memoized bodies
    pub memo_capacity: usize,
}

impl FetchCacheConfig {
    /// Counter lifetime; never shorter than one second.
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_seconds.max(1))
    }
}

impl Default for FetchCacheConfig {
    fn default() -> Self {
        Self {
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            memo_capacity: DEFAULT_MEMO_CAPACITY,
        }
    }
}

/// Callback notified when an access could not be counted.
///
/// Receives the resource key and the store error.
pub type AccessFailureHook = Arc<dyn Fn(&str, &TallyError) + Send + Sync>;

/// Fetcher wrapper with access counting and memoization.
pub struct AccessTrackedCache<S: KeyValueStore + ?Sized, F: Fetcher> {
    store: Arc<S>,
    fetcher: F,
    memo: MemoCache<String, String>,
    access_ttl: Duration,
    on_failure: Option<AccessFailureHook>,
}

impl<S: KeyValueStore + ?Sized, F: Fetcher> AccessTrackedCache<S, F> {
    /// Creates a cache with default configuration.
    pub fn new(store: Arc<S>, fetcher: F) -> Self {
        Self::with_config(store, fetcher, FetchCacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(store: Arc<S>, fetcher: F, config: FetchCacheConfig) -> Self {
        Self {
            store,
            fetcher,
            memo: MemoCache::with_config(MemoConfig::with_capacity(config.memo_capacity)),
            access_ttl: config.access_ttl(),
            on_failure: None,
        }
    }

    /// Registers a callback for accesses that could not be counted.
    pub fn with_failure_hook(mut self, hook: AccessFailureHook) -> Self {
        self.on_failure = Some(hook);
        self
    }

    /// Fetches `resource`, counting the access.
    ///
    /// Counting is best-effort and never fails the fetch. Failed fetches are
    /// returned as-is and not memoized.
    #[instrument(skip(self))]
    pub async fn fetch(&self, resource: &str) -> Result<String> {
        self.track_access(resource).await;

        if let Some(body) = self.memo.get(resource) {
            debug!("Memo hit");
            return Ok(body);
        }

        let body = self.fetcher.fetch(resource).await?;
        if let Some(evicted) = self.memo.insert(resource.to_string(), body.clone()) {
            debug!(evicted = %evicted, "Memo full, evicted least recent");
        }
        Ok(body)
    }

    /// Current access count of `resource`.
    ///
    /// `None` when the counter has expired, was never set, or the store
    /// cannot be read.
    pub async fn access_count(&self, resource: &str) -> Option<i64> {
        match self.store.get(&access_count_key(resource)).await {
            Ok(raw) => raw.and_then(|raw| raw.parse().ok()),
            Err(err) => {
                warn!(resource, error = %err, "Access count unavailable");
                None
            }
        }
    }

    /// Memo statistics.
    pub fn memo_stats(&self) -> MemoStats {
        self.memo.stats()
    }

    /// Drops the memoized body of `resource`. Returns true if one was present.
    pub fn invalidate(&self, resource: &str) -> bool {
        self.memo.remove(resource).is_some()
    }

    /// Drops every memoized body. Access counters are left alone.
    pub fn clear_memo(&self) {
        self.memo.clear();
    }

    async fn track_access(&self, resource: &str) {
        let key = access_count_key(resource);
        match self.bump(&key).await {
            Ok(count) => debug!(accesses = count, "Counted access"),
            Err(err) => {
                warn!(resource, error = %err, "Access not counted");
                if let Some(hook) = &self.on_failure {
                    hook(resource, &err);
                }
            }
        }
    }

    // Read-then-write; concurrent accesses to one resource may collapse.
    async fn bump(&self, key: &str) -> Result<i64> {
        let current = match self.store.get(key).await? {
            Some(raw) => raw.parse::<i64>().unwrap_or_else(|_| {
                warn!(key, value = %raw, "Access counter is not an integer, restarting");
                0
            }),
            None => 0,
        };
        let next = current.saturating_add(1);
        self.store
            .setex(key, self.access_ttl, &next.to_string())
            .await?;
        Ok(next)
    }
}
