//! Error types for the exploration engine
//!
//! Provides typed failures for:
//! - External service calls (start, answer, completion, apply)
//! - Session preconditions (single-flight guard, state checks)
//! - Registry, transcript and suggestion invariants
//! - Configuration loading

use crate::reconciler::SuggestionStatus;
use crate::transcript::{DeliveryStatus, TurnKind};
use crate::types::{SessionId, SessionStatus, SuggestionId, TurnId};
use std::path::PathBuf;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    /// The session never entered `in_progress`; retry with a fresh `start`
    #[error("session start failed: {source}")]
    StartFailure {
        /// Underlying service failure
        #[source]
        source: ServiceError,
    },

    /// The answer turn is recorded but was not acknowledged by the service
    #[error("answer submission failed: {source}")]
    AnswerSubmissionFailure {
        /// The answer turn left in `failed` delivery state
        turn_id: TurnId,
        /// Underlying service failure
        #[source]
        source: ServiceError,
    },

    /// The completion report could not be produced; session stays `completing`
    #[error("completion report for session {session_id} failed: {source}")]
    CompletionFailure {
        /// Session left in `completing`
        session_id: SessionId,
        /// Underlying service failure
        #[source]
        source: ServiceError,
    },

    /// The entity update call failed; no suggestion state changed
    #[error("applying {field_count} field change(s) failed: {source}")]
    ApplyChangesFailure {
        /// Number of fields in the rejected update map
        field_count: usize,
        /// Underlying service failure
        #[source]
        source: ServiceError,
    },

    /// Another request is still awaiting a response
    #[error("a request is already in flight for session {0}")]
    RequestInFlight(SessionId),

    /// Operation not permitted in the current session status
    #[error("cannot {operation} while session is {status}")]
    InvalidState {
        /// Operation that was attempted
        operation: &'static str,
        /// Status at the time of the attempt
        status: SessionStatus,
    },

    /// Session id does not match the controller's active session
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    /// Answer is blank after normalization
    #[error("answer is empty")]
    EmptyAnswer,

    /// Answer exceeds the configured length limit
    #[error("answer has {actual} characters, limit is {limit}")]
    AnswerTooLong { limit: usize, actual: usize },

    /// Retry requested but the latest answer is not in `failed` state
    #[error("no failed answer to retry")]
    NoFailedAnswer,

    /// Dimension registry error
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Session state machine error
    #[error("state machine error: {0}")]
    StateMachine(#[from] StateMachineError),

    /// Transcript error
    #[error("transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    /// Suggestion lifecycle error
    #[error("suggestion error: {0}")]
    Suggestion(#[from] SuggestionError),
}

impl ExploreError {
    /// Check if error is retryable by repeating the same operation
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StartFailure { source }
            | Self::AnswerSubmissionFailure { source, .. }
            | Self::CompletionFailure { source, .. }
            | Self::ApplyChangesFailure { source, .. } => source.is_transient(),
            Self::RequestInFlight(_) => true,
            _ => false,
        }
    }

    /// Cause-specific message suitable for a retry affordance
    #[must_use]
    pub fn retry_hint(&self) -> &'static str {
        match self {
            Self::StartFailure { .. } => "The session could not be started. Start again.",
            Self::AnswerSubmissionFailure { .. } => {
                "Your answer was saved but not processed. Retry sending it."
            }
            Self::CompletionFailure { .. } => {
                "The report could not be generated. Retry completion or restart the session."
            }
            Self::ApplyChangesFailure { .. } => {
                "The changes were not saved. Your selections are kept; apply again."
            }
            Self::RequestInFlight(_) => "Still waiting for the previous response.",
            Self::EmptyAnswer | Self::AnswerTooLong { .. } => "Edit your answer and send again.",
            _ => "The operation is not available right now.",
        }
    }
}

/// Failure reported by an external collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    /// Failure classification
    pub kind: ServiceErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl ServiceError {
    /// Create new service error
    #[inline]
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Transport-level failure
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Transport, message)
    }

    /// Timeout enforced by the transport
    #[inline]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Timeout, message)
    }

    /// Service refused the request
    #[inline]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Rejected, message)
    }

    /// Service replied with something unusable
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Malformed, message)
    }

    /// Whether repeating the call may succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ServiceErrorKind::Transport | ServiceErrorKind::Timeout
        )
    }
}

/// Service failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorKind {
    /// Network or connection failure
    Transport,
    /// Request exceeded the transport timeout
    Timeout,
    /// Request refused by the service
    Rejected,
    /// Response could not be interpreted
    Malformed,
}

impl std::fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Rejected => "rejected",
            Self::Malformed => "malformed",
        };
        f.write_str(name)
    }
}

/// Dimension registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No dimensions configured
    #[error("dimension registry is empty")]
    Empty,

    /// Key is blank
    #[error("dimension at position {position} has a blank key")]
    BlankKey { position: usize },

    /// Label is blank
    #[error("dimension {key} has a blank label")]
    BlankLabel { key: String },

    /// Key appears twice
    #[error("duplicate dimension key: {0}")]
    DuplicateKey(String),
}

/// Session state machine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    /// Transition not in the forward-only table
    #[error("illegal session transition {from} -> {to}")]
    IllegalTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}

/// Transcript errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    /// No turn with that id
    #[error("turn not found: {0}")]
    TurnNotFound(TurnId),

    /// Delivery status only applies to answer turns
    #[error("turn {id} is a {kind} turn and carries no delivery status")]
    NotAnAnswer { id: TurnId, kind: TurnKind },

    /// Delivery status change not permitted
    #[error("turn {id} cannot move from {from} to {to}")]
    IllegalDelivery {
        id: TurnId,
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    /// Hash chain or ordering broken at the given index
    #[error("transcript integrity violated at order index {index}")]
    IntegrityViolation { index: usize },
}

/// Suggestion lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuggestionError {
    /// No suggestion with that id
    #[error("suggestion not found: {0}")]
    NotFound(SuggestionId),

    /// Operation not permitted from the current status
    #[error("cannot {operation} suggestion {id} in status {from}")]
    InvalidTransition {
        id: SuggestionId,
        operation: &'static str,
        from: SuggestionStatus,
    },
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parse failure
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parse failure
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File extension not recognized
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// Dimensions did not form a valid registry
    #[error("invalid dimensions: {0}")]
    Registry(#[from] RegistryError),
}
