//! # Tally Recorder
//!
//! Call counting, call history and replay for instrumented operations.
//!
//! An operation is instrumented by running its calls through an [`Invoke`]
//! strategy. [`CallRecorder`] writes a counter and input/output logs to a
//! [`KeyValueStore`](tally_core::KeyValueStore); [`Direct`] runs calls as they
//! are. [`Replayer`] turns the recorded logs back into a report.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_recorder::{CallRecorder, Replayer};
//! use tally_core::{CallArgs, OperationId};
//!
//! let store = Arc::new(tally_store::MemoryStore::new());
//! let recorder = CallRecorder::new(store.clone());
//! let op = OperationId::new("Operation")?;
//!
//! for n in [3, 5] {
//!     recorder.record(&op, &CallArgs::new().arg(&n), || async move {
//!         Ok::<_, std::convert::Infallible>(n * 2)
//!     }).await?;
//! }
//!
//! let report = Replayer::new(store).replay(&op).await.unwrap();
//! println!("{report}");
//! // Operation was called 2 times:
//! // Operation(3,) -> 6
//! // Operation(5,) -> 10
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod data_cache;
mod invoke;
mod recorder;
mod replay;

#[cfg(test)]
mod test_support;

pub use data_cache::DataCache;
pub use invoke::{Direct, FailureHook, Invoke, RecordingFailure, RecordingStep};
pub use recorder::CallRecorder;
pub use replay::Replayer;
