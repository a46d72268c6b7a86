use crate::error::StateMachineError;
use crate::types::SessionStatus;

/// Validates a session status transition.
///
/// Transitions only move forward. Starting over is not a transition: `start`
/// and `reset` replace the session with a fresh idle one under a new id.
pub fn validate_transition(from: SessionStatus, to: SessionStatus) -> Result<(), StateMachineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(StateMachineError::IllegalTransition { from, to })
    }
}

pub fn allowed_transitions(from: SessionStatus) -> Vec<SessionStatus> {
    use SessionStatus::*;
    match from {
        Idle => vec![InProgress],
        InProgress => vec![Completing],
        Completing => vec![Completed],
        Completed => vec![],
    }
}

fn allowed(from: SessionStatus, to: SessionStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_chain_is_allowed() {
        assert!(validate_transition(SessionStatus::Idle, SessionStatus::InProgress).is_ok());
        assert!(validate_transition(SessionStatus::InProgress, SessionStatus::Completing).is_ok());
        assert!(validate_transition(SessionStatus::Completing, SessionStatus::Completed).is_ok());
    }

    #[test]
    fn backward_and_skipping_transitions_fail() {
        assert!(validate_transition(SessionStatus::Completed, SessionStatus::InProgress).is_err());
        assert!(validate_transition(SessionStatus::Completing, SessionStatus::InProgress).is_err());
        assert!(validate_transition(SessionStatus::Idle, SessionStatus::Completed).is_err());
        assert!(validate_transition(SessionStatus::InProgress, SessionStatus::InProgress).is_err());
    }
}
