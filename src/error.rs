//! Error types for launch complex operations.

use thiserror::Error;

use crate::launch_pad::PadState;

/// Errors produced by the scheduling engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A facility, pad, pool or queue item lookup missed.
    #[error("not found: {0}")]
    NotFound(String),
    /// Cross-entity bookkeeping disagrees with itself.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The pad state machine refused a transition.
    #[error("pad cannot {action} while {from:?}")]
    InvalidPadTransition {
        from: PadState,
        action: &'static str,
    },
    /// Descriptor edits need idle queues.
    #[error("facility cannot be modified: {0}")]
    CannotModify(String),
    /// Facility is busy, staffed or is the starting hangar.
    #[error("facility cannot be removed: {0}")]
    NotRemovable(String),
    /// Save document could not be decoded.
    #[error("persistence error: {0}")]
    Persistence(#[from] serde_json::Error),
    /// Settings failed validation.
    #[error("config error: {0}")]
    Config(String),
}

/// Result alias used across the crate.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::InvalidPadTransition {
            from: PadState::Destroyed,
            action: "begin rollout",
        };
        assert_eq!(err.to_string(), "pad cannot begin rollout while Destroyed");

        let err = EngineError::NotFound("facility 42".into());
        assert_eq!(err.to_string(), "not found: facility 42");
    }

    #[test]
    fn test_json_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: EngineError = parse.unwrap_err().into();
        assert!(matches!(err, EngineError::Persistence(_)));
    }
}
