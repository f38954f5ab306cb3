//! Error types for the controller.
//!
//! Defines custom error types with classification for retry behavior.
//! Spec problems are permanent: retrying cannot help until the spec changes.
//! Store failures are retryable: the next pass resumes where this one stopped.

use std::time::Duration;
use thiserror::Error;

use crate::resources::DependentKind;

/// Error type for controller operations
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Missing or empty required field in the spec
    #[error("{field} is required, got: {value}")]
    MissingField { field: String, value: String },

    /// Validation error in resource spec
    #[error("Validation error: {0}")]
    Validation(String),

    /// A status record the handler depends on is missing
    #[error("No {0} recorded in status; the server has not been reconciled yet")]
    MissingStatus(&'static str),

    /// Object store failure on a dependent
    #[error("Failed to {action} {kind} {name}: {message}")]
    Store {
        action: &'static str,
        kind: DependentKind,
        name: String,
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing-field error, rendering the offending value
    pub fn missing_field(field: impl Into<String>, value: Option<&serde_json::Value>) -> Self {
        Error::MissingField {
            field: field.into(),
            value: value.map_or_else(|| "None".to_string(), |v| v.to_string()),
        }
    }

    /// Wrap a failure of the dependent store so it is retried.
    ///
    /// Retryable API errors are kept as they are; any other store failure,
    /// including 403 and 404 responses, becomes [`Error::Store`].
    pub fn store(action: &'static str, kind: DependentKind, name: &str, err: Error) -> Self {
        match err {
            e @ Error::Store { .. } => e,
            e if e.is_retryable() => e,
            e => Error::Store {
                action,
                kind,
                name: name.to_string(),
                message: e.to_string(),
            },
        }
    }

    /// Check if this error indicates a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 404)
    }

    /// Check if this error indicates an already-exists condition
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 409 && e.reason == "AlreadyExists")
    }

    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube(e) => {
                // Retry on network errors, rate limiting, conflicts and server errors
                matches!(
                    e,
                    kube::Error::Api(api_err)
                        if api_err.code >= 500 || api_err.code == 429 || api_err.code == 409
                ) || matches!(e, kube::Error::Service(_))
            }
            Error::Store { .. } | Error::MissingStatus(_) => true,
            Error::Validation(_) | Error::MissingField { .. } => false,
            Error::Serialization(_) => false,
        }
    }

    /// Check if this error is permanent until the spec changes
    pub fn is_permanent(&self) -> bool {
        !self.is_retryable()
    }

    /// Get the recommended requeue duration for this error
    pub fn requeue_after(&self) -> Duration {
        if self.is_retryable() {
            Duration::from_secs(30)
        } else {
            // Spec must change first; the watch brings us back on that
            Duration::from_secs(300)
        }
    }
}

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, Error>;
