//! Error types for the Deckflow engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Deckflow engine.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Variants that describe
/// backend failures carry the service name so callers can apply per-service
/// retry policy.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum DeckflowError {
    /// Configuration error (missing required field, unknown variant id,
    /// unroutable service). Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend signalled rate limiting. Retryable with backoff; the backend
    /// may suggest a delay in milliseconds.
    #[error("Rate limited by '{service}': {message}")]
    RateLimited {
        service: String,
        message: String,
        retry_after_ms: Option<u64>,
    },

    /// Timeout or connection failure against a backend. Retryable.
    #[error("Transient network error from '{service}': {message}")]
    TransientNetwork { service: String, message: String },

    /// Backend rejected the request or returned an unusable response.
    /// Never retried.
    #[error("Service '{service}' failed ({status:?}): {message}")]
    PermanentService {
        service: String,
        status: Option<u16>,
        message: String,
    },

    /// Every item of a generation batch failed.
    #[error("Generation batch failed: {failed} of {total} items failed")]
    BatchFailed { failed: usize, total: usize },

    /// Optimistic concurrency check failed on a session write.
    #[error("Store conflict on session '{id}': expected version {expected}, found {found}")]
    StoreConflict {
        id: String,
        expected: u64,
        found: u64,
    },

    /// An intent arrived that has no transition from the current stage.
    #[error("Conflicting transition: intent '{intent}' is not valid in stage '{stage}'")]
    ConflictingTransition { stage: String, intent: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
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

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeckflowError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a RateLimited error
    pub fn rate_limited(
        service: impl Into<String>,
        message: impl Into<String>,
        retry_after_ms: Option<u64>,
    ) -> Self {
        Self::RateLimited {
            service: service.into(),
            message: message.into(),
            retry_after_ms,
        }
    }

    /// Creates a TransientNetwork error
    pub fn transient_network(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransientNetwork {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates a PermanentService error
    pub fn permanent_service(
        service: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::PermanentService {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a BatchFailed error
    pub fn batch_failed(failed: usize, total: usize) -> Self {
        Self::BatchFailed { failed, total }
    }

    /// Creates a StoreConflict error
    pub fn store_conflict(id: impl Into<String>, expected: u64, found: u64) -> Self {
        Self::StoreConflict {
            id: id.into(),
            expected,
            found,
        }
    }

    /// Creates a ConflictingTransition error
    pub fn conflicting_transition(stage: impl Into<String>, intent: impl Into<String>) -> Self {
        Self::ConflictingTransition {
            stage: stage.into(),
            intent: intent.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error may succeed on a later attempt.
    ///
    /// Returns true for:
    /// - `RateLimited` errors
    /// - `TransientNetwork` errors (timeouts, connection failures)
    ///
    /// All other variants are permanent and must not be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::TransientNetwork { .. })
    }

    /// Check if this is a RateLimited error
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Check if this is a Configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a StoreConflict error
    pub fn is_store_conflict(&self) -> bool {
        matches!(self, Self::StoreConflict { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The backend-suggested retry delay, if the backend provided one.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Self::RateLimited {
                retry_after_ms: Some(ms),
                ..
            } => Some(std::time::Duration::from_millis(*ms)),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for DeckflowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for DeckflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for DeckflowError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for DeckflowError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (transitional, should be removed eventually)
impl From<anyhow::Error> for DeckflowError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, DeckflowError>`.
pub type Result<T> = std::result::Result<T, DeckflowError>;
