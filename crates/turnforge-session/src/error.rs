//! Error types for the session layer.

use std::error::Error as StdError;

use turnforge_protocol::{Id, ProtocolError};
use turnforge_store::StoreError;

use crate::SessionStatus;

/// Errors that can occur during session lifecycle operations.
///
/// Every variant is a rejection: the enclosing transaction was rolled
/// back and nothing was written to the store or the cache.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The caller already plays in a NotStarted or Started game.
    #[error(
        "can not {verb} a new game while you are still participating in an active game, id: {game}, type: {game_type}"
    )]
    AlreadyInActiveGame {
        verb: &'static str,
        game: Id,
        game_type: String,
    },

    /// Join or start on a game that is past NotStarted.
    #[error("game {0} has already been started")]
    AlreadyStarted(Id),

    /// A turn was submitted before the game started.
    #[error("game {0} isn't started")]
    NotStarted(Id),

    /// The caller is a player, but not the one whose turn it is.
    #[error("it's not your turn")]
    NotYourTurn,

    /// Only the creator may start a game.
    #[error("only the creator can start the game")]
    NotCreator,

    /// The game already holds the maximum number of players.
    #[error("game is already at max player limit: {0}")]
    GameFull(usize),

    /// Start was requested with too few players.
    #[error("game hasn't met minimum player count requirement: {0}")]
    BelowMinPlayers(usize),

    /// The caller has no NotStarted or Started game.
    #[error("you are not in an active game")]
    NotInActiveGame,

    /// No game with this id exists.
    #[error("game {0} not found")]
    NotFound(Id),

    /// The stored game belongs to a different game type.
    #[error("types do not match, got: {found}, expected: {expected}")]
    TypeMismatch { expected: String, found: String },

    /// The game type tag is empty or too long.
    #[error("invalid game type {0:?}")]
    InvalidGameType(String),

    /// A status change the lifecycle doesn't allow, e.g. out of a
    /// terminal status.
    #[error("game can not go from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    /// The game rules rejected the move. Use [`SessionError::rule`] to
    /// recover the concrete rule error.
    #[error("move rejected: {0}")]
    Rule(#[source] Box<dyn StdError + Send + Sync + 'static>),

    /// The store or cache failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The envelope could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A fanned-out background task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SessionError {
    /// Returns the game rule error if this is a [`SessionError::Rule`] of
    /// type `E`.
    pub fn rule<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Rule(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns `true` if the caller was in the wrong state to ask.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInActiveGame { .. }
                | Self::AlreadyStarted(_)
                | Self::NotStarted(_)
                | Self::NotYourTurn
                | Self::NotCreator
                | Self::GameFull(_)
                | Self::BelowMinPlayers(_)
                | Self::NotInActiveGame
        )
    }
}
