//! Error types for the FindYou application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::{MatchStep, PendingMatch};

/// Classification of a failed store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// The backend could not be reached or timed out.
    Network,
    /// The backend refused the call for the signed-in user.
    Permission,
    /// The addressed document does not exist.
    NotFound,
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::Permission => "permission",
            Self::NotFound => "not-found",
        };
        f.write_str(label)
    }
}

/// One step of a match confirmation that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: MatchStep,
    /// The user whose document the step writes to.
    pub user_id: String,
    pub cause: FailureCause,
    pub message: String,
}

/// A shared error type for the entire FindYou application.
///
/// Every variant maps onto one short user-facing message through
/// [`FindYouError::user_message`], which is what the notification channel shows.
#[derive(Error, Debug, Clone)]
pub enum FindYouError {
    /// A required field was empty or an argument was unusable.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate username at sign-up.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Credentials rejected, or an operation attempted with the wrong session.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Store read or subscription failure.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The store refused the call.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A single list mutation failed.
    #[error("Update of user '{user_id}' failed ({cause}): {message}")]
    MutationFailed {
        user_id: String,
        cause: FailureCause,
        message: String,
    },

    /// Some steps of a match confirmation failed after others succeeded.
    ///
    /// `pending` carries everything needed to replay the failed steps.
    #[error("Match confirmation incomplete: {} step(s) failed", .failures.len())]
    PartialMutation {
        completed: Vec<MatchStep>,
        failures: Vec<StepFailure>,
        pending: Box<PendingMatch>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", "TOML", "migration"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FindYouError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a DataUnavailable error
    pub fn data_unavailable(message: impl Into<String>) -> Self {
        Self::DataUnavailable(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wraps a store failure as a mutation failure against `user_id`.
    pub fn mutation_failed(user_id: impl Into<String>, source: &FindYouError) -> Self {
        Self::MutationFailed {
            user_id: user_id.into(),
            cause: source.failure_cause(),
            message: source.to_string(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a data-unavailable error
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }

    /// Check if this is a partially applied match confirmation
    pub fn is_partial_mutation(&self) -> bool {
        matches!(self, Self::PartialMutation { .. })
    }

    /// Classifies the error the way store failures are reported to callers.
    pub fn failure_cause(&self) -> FailureCause {
        match self {
            Self::NotFound { .. } => FailureCause::NotFound,
            Self::PermissionDenied(_) | Self::Auth(_) => FailureCause::Permission,
            Self::MutationFailed { cause, .. } => *cause,
            _ => FailureCause::Network,
        }
    }

    /// Whether repeating the same call may succeed.
    ///
    /// Only network failures are transient; a missing document or a refused
    /// write stays that way.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::DataUnavailable(_) => true,
            Self::MutationFailed { cause, .. } => *cause == FailureCause::Network,
            _ => false,
        }
    }

    /// Short human-readable message for the notification channel.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Conflict(msg) | Self::Auth(msg) => msg.clone(),
            Self::NotFound { entity_type, .. } => format!("{} not found", entity_type),
            Self::DataUnavailable(_) => "Cannot reach the server, showing saved data".to_string(),
            Self::PermissionDenied(_) => "Permission denied".to_string(),
            Self::MutationFailed { cause, .. } => format!("Update failed ({})", cause),
            Self::PartialMutation { .. } => "Match saved partially, retrying later".to_string(),
            Self::Serialization { .. } => "Stored data is unreadable".to_string(),
            Self::Config(msg) => format!("Configuration problem: {}", msg),
            Self::Internal(_) => "Something went wrong".to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for FindYouError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for FindYouError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FindYouError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, FindYouError>`.
pub type Result<T> = std::result::Result<T, FindYouError>;
