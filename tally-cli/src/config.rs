//! CLI configuration from the environment.

use std::str::FromStr;

use anyhow::{Context, Result};

use tally_fetch::{FetchCacheConfig, HttpConfig};

/// Settings read from the environment and `.env`.
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    /// Redis URL; the in-memory store is used when unset
    pub redis_url: Option<String>,
    /// Access counter and memo settings
    pub fetch: FetchCacheConfig,
    /// HTTP client settings
    pub http: HttpConfig,
}

impl CliConfig {
    /// Loads `.env` if present, then reads `REDIS_URL`, `TALLY_ACCESS_TTL`,
    /// `TALLY_MEMO_CAPACITY` and `TALLY_HTTP_TIMEOUT`.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self {
            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
            ..Self::default()
        };

        if let Some(ttl) = parse_var(&lookup, "TALLY_ACCESS_TTL")? {
            config.fetch.access_ttl_seconds = ttl;
        }
        if let Some(capacity) = parse_var(&lookup, "TALLY_MEMO_CAPACITY")? {
            config.fetch.memo_capacity = capacity;
        }
        if let Some(timeout) = parse_var(&lookup, "TALLY_HTTP_TIMEOUT")? {
            config.http.timeout_seconds = timeout;
        }

        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .with_context(|| format!("{} must be a number, got '{}'", name, raw))
        })
        .transpose()
}
