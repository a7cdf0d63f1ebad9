//! Tally CLI
//!
//! Fetch pages with access counting, store values with recorded history and
//! replay what was recorded.

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tally_core::traits::KeyValueStore;
use tally_core::types::OperationId;
use tally_fetch::{AccessTrackedCache, HttpFetcher};
use tally_recorder::{DataCache, Replayer};
use tally_store::{MemoryStore, RedisStore};

use crate::config::CliConfig;

/// Tally - call recording, replay and access-tracked fetching
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Redis URL (in-memory store when unset)
    #[arg(long, global = true)]
    redis_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page through the access-tracked cache
    Fetch {
        /// Page URL
        url: String,
        /// Number of times to fetch
        #[arg(short, long, default_value = "1")]
        times: u32,
    },

    /// Store values under fresh keys
    Store {
        /// Values to store
        #[arg(required = true)]
        data: Vec<String>,
        /// Empty the store first
        #[arg(long)]
        flush: bool,
    },

    /// Replay the recorded history of an operation
    Replay {
        /// Operation identity, e.g. Cache.store
        identity: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read a stored value
    Get {
        /// Key returned by `store`
        key: String,
        /// Decode the value as an integer
        #[arg(long)]
        int: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "tally=debug,info"
    } else {
        "tally=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = CliConfig::from_env()?;
    if cli.redis_url.is_some() {
        config.redis_url = cli.redis_url;
    }

    let store = open_store(&config).await;

    match cli.command {
        Commands::Fetch { url, times } => cmd_fetch(store, &config, &url, times).await,
        Commands::Store { data, flush } => cmd_store(store, data, flush).await,
        Commands::Replay { identity, json } => cmd_replay(store, &identity, json).await,
        Commands::Get { key, int } => cmd_get(store, &key, int).await,
    }
}

/// Opens Redis when configured, falling back to memory when it is unreachable.
async fn open_store(config: &CliConfig) -> Arc<dyn KeyValueStore> {
    let Some(url) = config.redis_url.as_deref() else {
        return Arc::new(MemoryStore::new());
    };

    match RedisStore::connect(url).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            warn!(error = %err, "Redis unavailable, using in-memory store");
            println!(
                "{}",
                "⚠️  Redis unavailable, history will not outlive this process".yellow()
            );
            Arc::new(MemoryStore::new())
        }
    }
}

/// Fetch a page one or more times
async fn cmd_fetch(
    store: Arc<dyn KeyValueStore>,
    config: &CliConfig,
    url: &str,
    times: u32,
) -> Result<()> {
    println!("{} {}", "🌐 Fetching:".cyan().bold(), url);

    let fetcher = HttpFetcher::with_config(config.http.clone())?;
    let cache = AccessTrackedCache::with_config(store, fetcher, config.fetch.clone());

    let pb = ProgressBar::new(u64::from(times.max(1)));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let mut length = 0;
    for _ in 0..times.max(1) {
        let body = cache
            .fetch(url)
            .await
            .with_context(|| format!("failed to fetch {}", url))?;
        length = body.len();
        pb.inc(1);
    }
    pb.finish_and_clear();

    let stats = cache.memo_stats();
    println!("\n{}", "✅ Fetched".green().bold());
    println!("   {} {} bytes", "Content:".dimmed(), length);
    match cache.access_count(url).await {
        Some(count) => println!("   {} {}", "Accesses:".dimmed(), count),
        None => println!("   {} unknown", "Accesses:".dimmed()),
    }
    println!(
        "   {} {} hits, {} misses",
        "Memo:".dimmed(),
        stats.hits,
        stats.misses
    );

    Ok(())
}

/// Store values and show the recorded history
async fn cmd_store(store: Arc<dyn KeyValueStore>, data: Vec<String>, flush: bool) -> Result<()> {
    let cache = if flush {
        DataCache::new(store).await?
    } else {
        DataCache::open(store)
    };

    println!("{}", "💾 Storing values...".cyan().bold());
    for value in data {
        let key = cache.store(value.as_str()).await?;
        println!("   {} {}", key.yellow(), value);
    }

    if let Some(report) = cache.replay_store().await {
        println!("\n{}", report);
    }

    Ok(())
}

/// Replay the history of an operation
async fn cmd_replay(store: Arc<dyn KeyValueStore>, identity: &str, json: bool) -> Result<()> {
    let identity = OperationId::new(identity)?;

    let Some(report) = Replayer::new(store).replay(&identity).await else {
        println!("{}", "⚠️  History unavailable, store could not be read".yellow());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    Ok(())
}

/// Read a stored value
async fn cmd_get(store: Arc<dyn KeyValueStore>, key: &str, int: bool) -> Result<()> {
    let cache = DataCache::open(store);

    let value = if int {
        cache.get_int(key).await?.map(|n| n.to_string())
    } else {
        cache.get_str(key).await?
    };

    match value {
        Some(value) => println!("{}", value),
        None => println!("{} {}", "⚠️  No value under".yellow(), key),
    }

    Ok(())
}
