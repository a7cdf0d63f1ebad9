//! Call recorder.
//!
//! Wraps calls of an operation and records, per identity:
//!
//! ```text
//! {identity}          INCR before the call
//! {identity}:inputs   RPUSH of the arguments before the call
//! {identity}:outputs  RPUSH of the result after a successful call
//! ```
//!
//! Recording is best-effort. A failing store never changes what the wrapped
//! call returns.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use tally_core::error::TallyError;
use tally_core::traits::KeyValueStore;
use tally_core::types::{CallArgs, OperationId};

use crate::invoke::{FailureHook, Invoke, RecordingFailure, RecordingStep};

/// Invoker that records call counts and call history in a key-value store.
///
/// The store handle is injected and shared; the recorder adds no locking of
/// its own, so concurrent calls interleave exactly as the store's `INCR` and
/// `RPUSH` allow.
pub struct CallRecorder<S: KeyValueStore + ?Sized = dyn KeyValueStore> {
    store: Arc<S>,
    on_failure: Option<FailureHook>,
}

impl<S: KeyValueStore + ?Sized> CallRecorder<S> {
    /// Creates a recorder writing to `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            on_failure: None,
        }
    }

    /// Registers a callback for store writes that had to be skipped.
    pub fn with_failure_hook(mut self, hook: FailureHook) -> Self {
        self.on_failure = Some(hook);
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Records one call of `identity` and returns the call's result.
    ///
    /// Order per call: counter increment, input append, `call()`, output
    /// append on success. A failed call leaves its counter and input entry in
    /// place and appends no output.
    #[instrument(skip(self, identity, args, call), fields(identity = %identity))]
    pub async fn record<T, E, F, Fut>(
        &self,
        identity: &OperationId,
        args: &CallArgs,
        call: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: fmt::Display + Send,
        E: Send,
    {
        let count = self.store.incr(identity.count_key()).await;
        self.check(identity, RecordingStep::Count, count.map(|n| {
            debug!(calls = n, "Counted call");
        }));

        let inputs = self
            .store
            .rpush(&identity.inputs_key(), &args.to_string())
            .await;
        self.check(identity, RecordingStep::Inputs, inputs.map(drop));

        let result = call().await;

        let rendered = result.as_ref().ok().map(ToString::to_string);
        match rendered {
            Some(output) => {
                let outputs = self.store.rpush(&identity.outputs_key(), &output).await;
                self.check(identity, RecordingStep::Outputs, outputs.map(drop));
            }
            None => debug!("Call failed, output not recorded"),
        }

        result
    }

    /// Reports a skipped write to the log and the failure hook.
    fn check(&self, identity: &OperationId, step: RecordingStep, outcome: Result<(), TallyError>) {
        let Err(err) = outcome else {
            return;
        };
        warn!(identity = %identity, step = %step, error = %err, "Recording skipped");
        if let Some(hook) = &self.on_failure {
            hook(&RecordingFailure {
                identity: identity.to_string(),
                step,
                error: err.to_string(),
                unavailable: err.is_store_unavailable(),
            });
        }
    }
}

impl<S: KeyValueStore + ?Sized> Clone for CallRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            on_failure: self.on_failure.clone(),
        }
    }
}

impl<S: KeyValueStore + ?Sized> fmt::Debug for CallRecorder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRecorder")
            .field("failure_hook", &self.on_failure.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> Invoke for CallRecorder<S> {
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
        E: Send,
    {
        self.record(identity, args, call).await
    }
}
