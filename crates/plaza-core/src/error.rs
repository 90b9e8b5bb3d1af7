//! Error types for the Plaza client core.

use thiserror::Error;

/// A shared error type for the entire client core.
///
/// Every failure in this crate is local to one operation; nothing here is
/// fatal to the process. The variants follow the failure taxonomy of the
/// backend boundary: credential rejection, object upload, record
/// insert/delete, and feed queries each map to their own variant so callers
/// can route them to the right surface.
#[derive(Error, Debug, Clone)]
pub enum PlazaError {
    /// Credential verification failed (unknown email, wrong password,
    /// duplicate account, policy-rejected password).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Object upload was rejected (transport, quota, unsupported type).
    #[error("upload failed: {0}")]
    Upload(String),

    /// Record insert/delete was rejected (constraint violation,
    /// permission denial).
    #[error("persist rejected: {0}")]
    Persist(String),

    /// Feed fetch failed.
    #[error("query failed: {0}")]
    Query(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error (config file access)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlazaError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates an Upload error
    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload(message.into())
    }

    /// Creates a Persist error
    pub fn persist(message: impl Into<String>) -> Self {
        Self::Persist(message.into())
    }

    /// Creates a Query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an Auth error
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if this is an Upload error
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::Upload(_))
    }

    /// Check if this is a Persist error
    pub fn is_persist(&self) -> bool {
        matches!(self, Self::Persist(_))
    }

    /// Check if this is a Query error
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// True for the errors that abort a post submission but leave the
    /// draft intact for retry.
    pub fn is_retryable_submit(&self) -> bool {
        matches!(self, Self::Upload(_) | Self::Persist(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for PlazaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for PlazaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, PlazaError>`.
pub type Result<T> = std::result::Result<T, PlazaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_helpers() {
        assert!(PlazaError::auth("wrong password").is_auth());
        assert!(PlazaError::upload("quota exceeded").is_upload());
        assert!(PlazaError::persist("duplicate key").is_persist());
        assert!(PlazaError::query("timeout").is_query());
    }

    #[test]
    fn test_retryable_submit() {
        assert!(PlazaError::upload("transport").is_retryable_submit());
        assert!(PlazaError::persist("rejected").is_retryable_submit());
        assert!(!PlazaError::auth("nope").is_retryable_submit());
        assert!(!PlazaError::query("nope").is_retryable_submit());
    }

    #[test]
    fn test_from_serde_json() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let converted: PlazaError = err.into();
        assert!(matches!(
            converted,
            PlazaError::Serialization { ref format, .. } if format == "JSON"
        ));
    }
}
