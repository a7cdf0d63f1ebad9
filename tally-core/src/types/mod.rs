//! Domain types for tally.

mod args;
mod identity;
mod report;

pub use args::CallArgs;
pub use identity::{access_count_key, OperationId};
pub use report::{ReplayReport, ReplayedCall};
