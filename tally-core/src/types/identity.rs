//! Operation identities and the store keys derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ACCESS_COUNT_PREFIX, INPUTS_SUFFIX, OUTPUTS_SUFFIX};
use crate::error::{Result, TallyError};

/// Stable name of an instrumented operation, e.g. `Cache.store`.
///
/// The identity is the root of every key the recorder writes:
///
/// ```text
/// {identity}          call counter
/// {identity}:inputs   input log
/// {identity}:outputs  output log
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperationId(String);

impl OperationId {
    /// Creates an identity, rejecting empty or whitespace-only names.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TallyError::InvalidIdentity(
                "identity cannot be empty".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Creates an identity from a constant name.
    ///
    /// The caller guarantees the name is non-empty.
    pub fn from_static(name: &'static str) -> Self {
        debug_assert!(!name.trim().is_empty(), "operation identity cannot be empty");
        Self(name.to_owned())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the call counter.
    pub fn count_key(&self) -> &str {
        &self.0
    }

    /// Key of the input log.
    pub fn inputs_key(&self) -> String {
        format!("{}{}", self.0, INPUTS_SUFFIX)
    }

    /// Key of the output log.
    pub fn outputs_key(&self) -> String {
        format!("{}{}", self.0, OUTPUTS_SUFFIX)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OperationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OperationId {
    type Error = TallyError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for OperationId {
    type Error = TallyError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<OperationId> for String {
    fn from(id: OperationId) -> Self {
        id.0
    }
}

/// Key of the access counter for `resource`: `count:{resource}`.
pub fn access_count_key(resource: &str) -> String {
    format!("{}{}", ACCESS_COUNT_PREFIX, resource)
}
