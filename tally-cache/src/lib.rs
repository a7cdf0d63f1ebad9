//! Bounded in-process memoization for tally.
//!
//! Thread-safe LRU map with a fixed capacity and hit/miss accounting.

mod cache;

pub use cache::{MemoCache, MemoConfig, MemoStats};
