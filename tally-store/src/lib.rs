//! # Tally Store
//!
//! Key-value store backends implementing the [`KeyValueStore`] contract.
//!
//! - **Memory**: in-process storage with expiry, for development and testing
//! - **Redis**: shared storage for multi-process deployments (feature: `redis`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use tally_store::{KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.incr("Cache.store").await?;
//! store.rpush("Cache.store:inputs", "(\"hello\",)").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisStore};

// Re-export the trait from core
pub use tally_core::traits::KeyValueStore;
