//! Unified error type for Turnforge.

use turnforge_blockers::PlacementError;
use turnforge_protocol::ProtocolError;
use turnforge_session::SessionError;
use turnforge_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` conversions let `?` lift any layer's error into this
/// one. Session errors carrying a Blockers rule violation are unwrapped
/// into [`TurnforgeError::Placement`] by [`TurnforgeError::from_session`].
#[derive(Debug, thiserror::Error)]
pub enum TurnforgeError {
    /// Encoding or decoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The store or cache failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A lifecycle precondition failed, or infrastructure below it.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The move is illegal under the Blockers rules.
    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl TurnforgeError {
    /// Lifts a session error, pulling out a wrapped placement error.
    pub fn from_session(err: SessionError) -> Self {
        match err.rule::<PlacementError>() {
            Some(placement) => Self::Placement(*placement),
            None => Self::Session(err),
        }
    }

    /// The session error, if this is one.
    pub fn as_session(&self) -> Option<&SessionError> {
        match self {
            Self::Session(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store_error() {
        let err = StoreError::Unavailable("down".into());
        let tf_err: TurnforgeError = err.into();
        assert!(matches!(tf_err, TurnforgeError::Store(_)));
        assert!(tf_err.to_string().contains("down"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidId("nope".into());
        let tf_err: TurnforgeError = err.into();
        assert!(matches!(tf_err, TurnforgeError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let tf_err: TurnforgeError = SessionError::NotYourTurn.into();
        assert!(matches!(tf_err.as_session(), Some(SessionError::NotYourTurn)));
    }

    #[test]
    fn test_from_session_unwraps_placement() {
        let err = SessionError::Rule(Box::new(PlacementError::FirstCornerRequired));
        let tf_err = TurnforgeError::from_session(err);
        assert!(matches!(
            tf_err,
            TurnforgeError::Placement(PlacementError::FirstCornerRequired)
        ));
        assert_eq!(tf_err.to_string(), "first corner constraint not met");
    }

    #[test]
    fn test_from_session_keeps_preconditions() {
        let tf_err = TurnforgeError::from_session(SessionError::NotCreator);
        assert!(matches!(tf_err, TurnforgeError::Session(SessionError::NotCreator)));
    }
}
