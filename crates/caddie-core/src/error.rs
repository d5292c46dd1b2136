//! Error types for the Caddie application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Caddie application.
///
/// The first four variants form the domain taxonomy (storage corruption,
/// contract violations on rounds and the chat bridge, upstream model
/// failures). The rest cover ambient failures with automatic conversion from
/// common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CaddieError {
    /// Persisted payload could not be parsed as a `GolfData` record.
    #[error("Stored data is corrupt: {0}")]
    StorageCorrupt(String),

    /// An operation referenced a round that does not exist.
    #[error("Round not found: '{round_id}'")]
    InvalidRound { round_id: String },

    /// The chat bridge was used before a session was initialized.
    #[error("Chat session not initialized. Call initialize first.")]
    NotInitialized,

    /// The remote model call failed or returned no usable text.
    #[error("Upstream model error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Upstream {
        status: Option<u16>,
        message: String,
        retryable: bool,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Screen navigation that the state machine does not allow.
    #[error("Invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    /// Photo payload that is not a usable image.
    #[error("Invalid photo: {0}")]
    InvalidPhoto(String),

    /// A platform media resource is already held.
    #[error("Media resource busy: {0} is already in use")]
    MediaBusy(String),

    /// Golfer input outside the accepted range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CaddieError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidRound error
    pub fn invalid_round(round_id: impl Into<String>) -> Self {
        Self::InvalidRound {
            round_id: round_id.into(),
        }
    }

    /// Creates an Upstream error
    pub fn upstream(status: Option<u16>, message: impl Into<String>, retryable: bool) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
            retryable,
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a StorageCorrupt error
    pub fn is_storage_corrupt(&self) -> bool {
        matches!(self, Self::StorageCorrupt(_))
    }

    /// Check if this is an InvalidRound error
    pub fn is_invalid_round(&self) -> bool {
        matches!(self, Self::InvalidRound { .. })
    }

    /// Check if this is a NotInitialized error
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized)
    }

    /// Check if this is an InvalidInput error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is an Upstream error
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    /// Returns true for upstream failures worth one immediate retry
    /// (connection problems, timeouts, 429 and 5xx responses).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Upstream {
                retryable: true,
                ..
            }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CaddieError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CaddieError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CaddieError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for CaddieError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            retryable: err.is_connect() || err.is_timeout(),
        }
    }
}

/// Conversion from anyhow::Error (used at the binary boundary)
impl From<anyhow::Error> for CaddieError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, CaddieError>`.
pub type Result<T> = std::result::Result<T, CaddieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_includes_status() {
        let err = CaddieError::upstream(Some(503), "UNAVAILABLE: overloaded", true);
        assert_eq!(
            err.to_string(),
            "Upstream model error (503): UNAVAILABLE: overloaded"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_upstream_display_without_status() {
        let err = CaddieError::upstream(None, "empty reply", false);
        assert_eq!(err.to_string(), "Upstream model error: empty reply");
        assert!(err.is_upstream());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CaddieError = io.into();
        assert!(matches!(err, CaddieError::Io { .. }));
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CaddieError = json_err.into();
        assert!(matches!(err, CaddieError::Serialization { ref format, .. } if format == "JSON"));
    }
}
