//! # Tally Core
//!
//! Core types, errors, and traits shared by every tally crate.
//!
//! - **Traits**: the [`KeyValueStore`] capability contract and the [`Fetcher`] seam
//! - **Types**: operation identities, derived store keys, call arguments, replay reports
//! - **Errors**: a single [`TallyError`] with classification helpers
//! - **Constants**: key suffixes and cache defaults
//!
//! ## Example
//!
//! ```rust
//! use tally_core::{CallArgs, OperationId};
//!
//! let op = OperationId::new("Cache.store").unwrap();
//! assert_eq!(op.inputs_key(), "Cache.store:inputs");
//!
//! let args = CallArgs::new().arg(&3);
//! assert_eq!(args.to_string(), "(3,)");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, TallyError};
pub use traits::*;
pub use types::*;
