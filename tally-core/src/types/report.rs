//! Human-readable call history.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One replayed call: the serialized inputs and the output they produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayedCall {
    /// Tuple literal of the call's arguments, as written to the input log
    pub inputs: String,
    /// Rendered return value, as written to the output log
    pub output: String,
}

/// Call history of one operation.
///
/// `Display` produces the report text:
///
/// ```text
/// Operation was called 2 times:
/// Operation(3,) -> 6
/// Operation(5,) -> 10
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Operation identity
    pub identity: String,
    /// Value of the call counter (0 when absent)
    pub count: i64,
    /// Paired log entries in chronological order
    pub calls: Vec<ReplayedCall>,
}

impl ReplayReport {
    /// Report for an operation that was never called.
    pub fn empty(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            count: 0,
            calls: Vec::new(),
        }
    }

    /// Pairs the two logs entry by entry.
    ///
    /// Pairing is positional. A call that fails logs inputs but no output, so
    /// every later output pairs with the inputs of the call before it, and
    /// the trailing inputs are dropped. Only a failure of the last call
    /// leaves the earlier pairs aligned.
    pub fn from_logs(
        identity: impl Into<String>,
        count: i64,
        inputs: Vec<String>,
        outputs: Vec<String>,
    ) -> Self {
        let calls = inputs
            .into_iter()
            .zip(outputs)
            .map(|(inputs, output)| ReplayedCall { inputs, output })
            .collect();
        Self {
            identity: identity.into(),
            count,
            calls,
        }
    }

    /// Summary line: `{identity} was called {count} times:`.
    pub fn summary(&self) -> String {
        format!("{} was called {} times:", self.identity, self.count)
    }
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())?;
        for call in &self.calls {
            write!(f, "\n{}{} -> {}", self.identity, call.inputs, call.output)?;
        }
        Ok(())
    }
}
