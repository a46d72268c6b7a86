//! Core types for the exploration engine
//!
//! Defines:
//! - Identifiers (ULID for sortability)
//! - Dimensions
//! - Sessions and their status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Ulid);

        impl $name {
            /// Generate new identifier
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ulid_id!(
    /// Unique session identifier, fresh on every `start` and `reset`
    SessionId
);
ulid_id!(
    /// Unique transcript turn identifier
    TurnId
);
ulid_id!(
    /// Unique field suggestion identifier
    SuggestionId
);

/// One configured topic the exploration must cover
///
/// `key` and `label` are opaque to the engine; presentation layers map keys
/// to icons or renderers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// Stable identifier used to tag turns
    pub key: String,
    /// Display label
    pub label: String,
    /// Position in the registry; lower is asked first
    pub order: u32,
}

impl Dimension {
    /// Create new dimension
    #[inline]
    pub fn new(key: impl Into<String>, label: impl Into<String>, order: u32) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            order,
        }
    }
}

/// Session lifecycle status
///
/// Transitions only move forward; see [`crate::state_machine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, not yet started (or start failed)
    Idle,
    /// Accepting answers
    InProgress,
    /// All dimensions covered, report requested
    Completing,
    /// Report received
    Completed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completing => "completing",
            SessionStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Snapshot of an exploration session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Engine-local session id
    pub id: SessionId,
    /// Lifecycle status
    pub status: SessionStatus,
    /// Service-reported progress, clamped to 0..=100
    pub progress_percent: u8,
    /// Dimensions answered so far, never above `total_dimensions`
    pub answered_dimension_count: usize,
    /// Size of the registry this session explores
    pub total_dimensions: usize,
    /// Identifier assigned by the exploration service once started
    pub remote_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh idle session
    #[must_use]
    pub fn new(total_dimensions: usize) -> Self {
        Self {
            id: SessionId::new(),
            status: SessionStatus::Idle,
            progress_percent: 0,
            answered_dimension_count: 0,
            total_dimensions,
            remote_id: None,
            created_at: Utc::now(),
        }
    }

    /// Dimensions still to cover
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total_dimensions
            .saturating_sub(self.answered_dimension_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn fresh_session_is_idle() {
        let session = Session::new(3);
        assert_eq!(session.status, SessionStatus::Idle);
        assert_eq!(session.progress_percent, 0);
        assert_eq!(session.remaining(), 3);
        assert!(session.remote_id.is_none());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(SessionStatus::Completing.to_string(), "completing");
    }
}
