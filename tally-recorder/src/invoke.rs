//! Invocation strategies for instrumented operations.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use tally_core::types::{CallArgs, OperationId};

/// Runs one call of an instrumented operation.
///
/// Components that expose instrumented operations are generic over this
/// trait and pick the strategy at construction time: [`CallRecorder`]
/// records history in the store, [`Direct`] just runs the call.
///
/// [`CallRecorder`]: crate::CallRecorder
#[async_trait]
pub trait Invoke: Send + Sync {
    /// Runs `call` as one invocation of `identity` with arguments `args`.
    ///
    /// The result of `call` is returned unchanged.
    async fn invoke<T, E, F, Fut>(
        &self,
        identity: &OperationId,
        args: &CallArgs,
        call: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: fmt::Display + Send,
        E: Send;
}

/// Invoker that runs calls without recording anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct Direct;

#[async_trait]
impl Invoke for Direct {
    async fn invoke<T, E, F, Fut>(
        &self,
        _identity: &OperationId,
        _args: &CallArgs,
        call: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: fmt::Display + Send,
        E: Send,
    {
        call().await
    }
}

/// Which store write of a recorded call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingStep {
    /// Incrementing the call counter
    Count,
    /// Appending to the input log
    Inputs,
    /// Appending to the output log
    Outputs,
}

impl fmt::Display for RecordingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingStep::Count => "count",
            RecordingStep::Inputs => "inputs",
            RecordingStep::Outputs => "outputs",
        };
        f.write_str(name)
    }
}

/// A store write that was skipped because the store failed.
#[derive(Clone, Debug)]
pub struct RecordingFailure {
    /// Identity of the operation being recorded
    pub identity: String,
    /// Step that failed
    pub step: RecordingStep,
    /// Rendered store error
    pub error: String,
    /// True if the store could not be reached at all
    pub unavailable: bool,
}

/// Callback notified of every skipped store write.
pub type FailureHook = Arc<dyn Fn(&RecordingFailure) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_passes_result_through() {
        let id = OperationId::new("Operation").unwrap();
        let args = CallArgs::new().arg(&3);

        let ok: Result<i32, String> = Direct.invoke(&id, &args, || async { Ok(6) }).await;
        assert_eq!(ok, Ok(6));

        let err: Result<i32, String> = Direct
            .invoke(&id, &args, || async { Err("boom".to_string()) })
            .await;
        assert_eq!(err, Err("boom".to_string()));
    }

    #[test]
    fn test_step_display() {
        assert_eq!(RecordingStep::Count.to_string(), "count");
        assert_eq!(RecordingStep::Outputs.to_string(), "outputs");
    }
}
