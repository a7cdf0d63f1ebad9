//! Replay of recorded call history.

use std::io;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use tally_core::error::Result;
use tally_core::traits::KeyValueStore;
use tally_core::types::{OperationId, ReplayReport};

/// Reads what a [`CallRecorder`](crate::CallRecorder) wrote and renders it.
///
/// Purely a reader: nothing in the store is modified.
pub struct Replayer<S: KeyValueStore + ?Sized = dyn KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> Replayer<S> {
    /// Creates a replayer reading from `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Builds the call history of `identity`.
    ///
    /// Returns `None` when the store cannot be read; the failure is logged.
    /// An operation that was never called yields a zero-count report.
    #[instrument(skip(self, identity), fields(identity = %identity))]
    pub async fn replay(&self, identity: &OperationId) -> Option<ReplayReport> {
        match self.load(identity).await {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(error = %err, "Replay unavailable");
                None
            }
        }
    }

    /// Writes the report for `identity` to `out`, one line per entry.
    ///
    /// Writes nothing when the history cannot be read.
    pub async fn replay_to<W: io::Write>(&self, identity: &OperationId, out: &mut W) -> io::Result<()> {
        if let Some(report) = self.replay(identity).await {
            writeln!(out, "{}", report)?;
        }
        Ok(())
    }

    async fn load(&self, identity: &OperationId) -> Result<ReplayReport> {
        let count = self.call_count(identity).await?;
        let inputs = self.store.lrange(&identity.inputs_key(), 0, -1).await?;
        let outputs = self.store.lrange(&identity.outputs_key(), 0, -1).await?;

        if inputs.len() != outputs.len() {
            debug!(
                inputs = inputs.len(),
                outputs = outputs.len(),
                "Logs diverge, truncating to the shorter"
            );
        }

        Ok(ReplayReport::from_logs(identity.as_str(), count, inputs, outputs))
    }

    async fn call_count(&self, identity: &OperationId) -> Result<i64> {
        let key = identity.count_key();
        if !self.store.exists(key).await? {
            return Ok(0);
        }
        let raw = self.store.get(key).await?;
        Ok(raw
            .as_deref()
            .map(|raw| {
                raw.parse().unwrap_or_else(|_| {
                    warn!(value = raw, "Call counter is not an integer");
                    0
                })
            })
            .unwrap_or(0))
    }
}

impl<S: KeyValueStore + ?Sized> Clone for Replayer<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::types::CallArgs;
    use tally_store::MemoryStore;

    use crate::recorder::CallRecorder;
    use crate::test_support::OfflineStore;

    fn op() -> OperationId {
        OperationId::new("Operation").unwrap()
    }

    #[tokio::test]
    async fn test_replay_report_text() {
        let store = Arc::new(MemoryStore::new());
        let recorder = CallRecorder::new(store.clone());

        for n in [3i64, 5] {
            let _: std::result::Result<i64, String> = recorder
                .record(&op(), &CallArgs::new().arg(&n), || async move { Ok(n * 2) })
                .await;
        }

        let report = Replayer::new(store).replay(&op()).await.unwrap();
        assert_eq!(
            report.to_string(),
            "Operation was called 2 times:\nOperation(3,) -> 6\nOperation(5,) -> 10"
        );
    }

    #[tokio::test]
    async fn test_replay_never_called() {
        let replayer = Replayer::new(Arc::new(MemoryStore::new()));
        let report = replayer.replay(&op()).await.unwrap();
        assert_eq!(report.count, 0);
        assert!(report.calls.is_empty());
        assert_eq!(report.to_string(), "Operation was called 0 times:");
    }

    #[tokio::test]
    async fn test_replay_truncates_after_failed_call() {
        let store = Arc::new(MemoryStore::new());
        let recorder = CallRecorder::new(store.clone());

        let _: std::result::Result<i64, String> = recorder
            .record(&op(), &CallArgs::new().arg(&1), || async { Ok(1) })
            .await;
        let _: std::result::Result<i64, String> = recorder
            .record(&op(), &CallArgs::new().arg(&2), || async { Err("boom".into()) })
            .await;

        let report = Replayer::new(store).replay(&op()).await.unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.calls.len(), 1);
        assert_eq!(report.calls[0].output, "1");
    }

    #[tokio::test]
    async fn test_replay_pairs_positionally_after_mid_failure() {
        let store = Arc::new(MemoryStore::new());
        let recorder = CallRecorder::new(store.clone());

        for n in [1i64, 2, 3] {
            let _: std::result::Result<i64, String> = recorder
                .record(&op(), &CallArgs::new().arg(&n), || async move {
                    if n == 2 {
                        Err("boom".into())
                    } else {
                        Ok(n * 10)
                    }
                })
                .await;
        }

        let report = Replayer::new(store).replay(&op()).await.unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(
            report.to_string(),
            "Operation was called 3 times:\nOperation(1,) -> 10\nOperation(2,) -> 30"
        );
    }

    #[tokio::test]
    async fn test_replay_more_outputs_than_inputs() {
        let store = Arc::new(MemoryStore::new());
        store.incr("Operation").await.unwrap();
        store.rpush("Operation:inputs", "(1,)").await.unwrap();
        store.rpush("Operation:outputs", "a").await.unwrap();
        store.rpush("Operation:outputs", "b").await.unwrap();

        let report = Replayer::new(store).replay(&op()).await.unwrap();
        assert_eq!(report.calls.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_offline_store_is_noop() {
        let replayer = Replayer::new(Arc::new(OfflineStore));
        assert!(replayer.replay(&op()).await.is_none());

        let mut out = Vec::new();
        replayer.replay_to(&op(), &mut out).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_replay_to_writer() {
        let store = Arc::new(MemoryStore::new());
        let recorder = CallRecorder::new(store.clone());
        let _: std::result::Result<&str, String> = recorder
            .record(&op(), &CallArgs::new(), || async { Ok("ok") })
            .await;

        let mut out = Vec::new();
        Replayer::new(store).replay_to(&op(), &mut out).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Operation was called 1 times:\nOperation() -> ok\n"
        );
    }

    #[tokio::test]
    async fn test_replay_garbage_counter() {
        let store = Arc::new(MemoryStore::new());
        store.set("Operation", "many").await.unwrap();
        let report = Replayer::new(store).replay(&op()).await.unwrap();
        assert_eq!(report.count, 0);
    }

    #[tokio::test]
    async fn test_replay_does_not_mutate() {
        let store = Arc::new(MemoryStore::new());
        let replayer = Replayer::new(store.clone());
        replayer.replay(&op()).await.unwrap();
        assert!(store.is_empty());
    }
}
