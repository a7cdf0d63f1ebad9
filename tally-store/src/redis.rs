//! Redis-backed key-value store.
//!
//! Shares counters and call history between processes. The connection is
//! opened lazily on first use and reused for the lifetime of the store;
//! it closes when the last clone of the store is dropped.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use tally_core::error::{Result, TallyError};
use tally_core::traits::KeyValueStore;

/// Redis store configuration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RedisConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379/0`
    pub url: String,
}

impl RedisConfig {
    /// Creates config for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new("redis://127.0.0.1:6379/0")
    }
}

/// Key-value store backed by a Redis server.
pub struct RedisStore {
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisStore {
    /// Creates a store for `config.url` without connecting.
    ///
    /// Fails only when the URL itself is malformed. A server that is down is
    /// reported as [`TallyError::StoreUnavailable`] by each operation until
    /// a connection succeeds.
    pub fn with_config(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| TallyError::ConfigError(format!("invalid Redis URL: {}", e)))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    /// Creates a store and connects immediately.
    pub async fn connect(url: impl Into<String>) -> Result<Self> {
        let store = Self::with_config(RedisConfig::new(url))?;
        store.connection().await?;
        Ok(store)
    }

    /// Shared multiplexed connection, opened on first call.
    async fn connection(&self) -> Result<MultiplexedConnection> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                let conn = self
                    .client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| map_redis_error("", e))?;
                info!("Connected to Redis");
                Ok::<_, TallyError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }
}

/// Maps a Redis error to the tally taxonomy.
fn map_redis_error(key: &str, err: RedisError) -> TallyError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        return TallyError::StoreUnavailable(err.to_string());
    }
    if err.code() == Some("WRONGTYPE") {
        return TallyError::wrong_type(key, err.to_string());
    }
    TallyError::StoreError(err.to_string())
}

#[async_trait]
impl KeyValueStore for RedisStore {
    #[instrument(skip(self))]
    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection().await?;
        conn.incr(key, 1i64)
            .await
            .map_err(|e| map_redis_error(key, e))
    }

    #[instrument(skip(self, value))]
    async fn rpush(&self, key: &str, value: &str) -> Result<usize> {
        let mut conn = self.connection().await?;
        conn.rpush(key, value)
            .await
            .map_err(|e| map_redis_error(key, e))
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        conn.lrange(key, start, stop)
            .await
            .map_err(|e| map_redis_error(key, e))
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(|e| map_redis_error(key, e))
    }

    #[instrument(skip(self, value))]
    async fn setex(&self, key: &str, ttl: Duration, value: &str) -> Result<()> {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let mut conn = self.connection().await?;
        conn.pset_ex(key, value, millis)
            .await
            .map_err(|e| map_redis_error(key, e))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.set(key, value)
            .await
            .map_err(|e| map_redis_error(key, e))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        conn.exists(key)
            .await
            .map_err(|e| map_redis_error(key, e))
    }

    async fn flush(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("", e))?;
        debug!("Flushed Redis database");
        Ok(())
    }
}
