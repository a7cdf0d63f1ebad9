//! Error types for tally.
//!
//! One enum covers every crate in the workspace. Store backends and the HTTP
//! fetcher map their native errors into it so that callers can classify
//! failures without depending on `redis` or `reqwest` directly.

use thiserror::Error;

/// Result type alias using `TallyError`.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Main error type for all tally operations.
#[derive(Debug, Error)]
pub enum TallyError {
    // ═══════════════════════════════════════════════════════════════════════════
    // STORE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The key-value store cannot be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A list operation hit a scalar key, or an increment hit a non-integer.
    #[error("Wrong type for key '{key}': {reason}")]
    WrongType { key: String, reason: String },

    /// Any other backend failure.
    #[error("Store error: {0}")]
    StoreError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // FETCH ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Transport-level HTTP failure (DNS, connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from '{url}'")]
    HttpStatus { url: String, status: u16 },

    /// The resource key is not a valid absolute URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Operation identities must be non-empty.
    #[error("Invalid operation identity: {0}")]
    InvalidIdentity(String),

    /// A stored value could not be converted to the requested type.
    #[error("Cannot decode value of '{key}': {reason}")]
    Decode { key: String, reason: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl TallyError {
    /// Returns true if the store could not be reached at all.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, TallyError::StoreUnavailable(_))
    }

    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        match self {
            TallyError::StoreUnavailable(_) | TallyError::HttpError(_) => true,
            TallyError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this error came from the key-value store.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            TallyError::StoreUnavailable(_)
                | TallyError::WrongType { .. }
                | TallyError::StoreError(_)
        )
    }

    /// Shorthand for a wrong-type error on `key`.
    pub fn wrong_type(key: impl Into<String>, reason: impl Into<String>) -> Self {
        TallyError::WrongType {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TallyError::HttpStatus {
            url: "http://example.com".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 from 'http://example.com'");

        let err = TallyError::wrong_type("Cache.store:inputs", "not a list");
        assert!(err.to_string().contains("Cache.store:inputs"));
    }

    #[test]
    fn test_error_classification() {
        assert!(TallyError::StoreUnavailable("refused".into()).is_store_unavailable());
        assert!(TallyError::StoreUnavailable("refused".into()).is_recoverable());
        assert!(!TallyError::StoreError("oops".into()).is_store_unavailable());
        assert!(TallyError::StoreError("oops".into()).is_store_error());

        let server = TallyError::HttpStatus { url: "u".into(), status: 503 };
        let client = TallyError::HttpStatus { url: "u".into(), status: 404 };
        assert!(server.is_recoverable());
        assert!(!client.is_recoverable());
        assert!(!client.is_store_error());

        assert!(!TallyError::InvalidIdentity("".into()).is_recoverable());
    }
}
