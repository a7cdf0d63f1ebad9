//! Page fetching for tally.
//!
//! [`HttpFetcher`] retrieves pages over HTTP. [`AccessTrackedCache`] wraps any
//! [`Fetcher`](tally_core::Fetcher), counts accesses per resource in a
//! key-value store under a sliding expiry, and memoizes successful bodies
//! in process.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod http;
mod tracker;

pub use http::{HttpConfig, HttpFetcher};
pub use tracker::{AccessFailureHook, AccessTrackedCache, FetchCacheConfig};
