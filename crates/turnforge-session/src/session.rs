//! The session envelope: the game-type-agnostic wrapper around a payload.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use turnforge_protocol::Id;

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a serialized session stays in the read cache after the
    /// write that put it there.
    pub cache_ttl: Duration,

    /// Maximum length, in characters, of a game type tag.
    pub game_type_max_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            game_type_max_len: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// The lifecycle status of a session.
///
/// ```text
/// NotStarted ──(start)──→ Started ──(all quadrants ended)──→ Finished
///      │                     │
///      └──────(abandon)──────┴──→ Abandoned
/// ```
///
/// Finished and Abandoned are terminal: the envelope is never written
/// again and only the expiry sweep removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    NotStarted,
    Started,
    Finished,
    Abandoned,
}

impl SessionStatus {
    /// Returns `true` for NotStarted and Started.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::NotStarted | Self::Started)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::NotStarted, Self::Started)
                | (Self::Started, Self::Finished)
                | (Self::NotStarted | Self::Started, Self::Abandoned)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NotStarted"),
            Self::Started => write!(f, "Started"),
            Self::Finished => write!(f, "Finished"),
            Self::Abandoned => write!(f, "Abandoned"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One game instance: players, turn counter and status around the
/// game-specific payload `P`.
///
/// Serialized as a single document (camelCase field names, fields in
/// declaration order) both in the store and in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session<P> {
    /// Session id. Also the creator's participant id.
    pub id: Id,

    /// Game type tag selecting the payload schema. Immutable.
    pub game_type: String,

    pub created_on: DateTime<Utc>,

    /// Changes on every committed mutation.
    pub updated_on: DateTime<Utc>,

    pub status: SessionStatus,

    /// Participant ids in turn order. Fixed once the game starts.
    pub players: Vec<Id>,

    /// Number of turns taken, including turns skipped over eliminated
    /// seats by the game rules.
    pub turn: u32,

    pub payload: P,
}

impl<P> Session<P> {
    /// Returns `true` while the session is NotStarted or Started.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Moves the session to `to`, if the lifecycle allows it.
    pub fn transition(&mut self, to: SessionStatus) -> Result<(), SessionError> {
        if !self.status.can_transition_to(to) {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Returns `true` if `participant` plays in this session.
    pub fn is_player(&self, participant: Id) -> bool {
        self.players.contains(&participant)
    }

    /// The participant whose turn it is, for a started session.
    pub fn current_player(&self) -> Option<Id> {
        if self.status != SessionStatus::Started || self.players.is_empty() {
            return None;
        }
        let idx = self.turn as usize % self.players.len();
        self.players.get(idx).copied()
    }

    /// Returns `true` if `participant` may take the next turn.
    pub fn is_turn_of(&self, participant: Id) -> bool {
        self.current_player() == Some(participant)
    }

    /// The creator's participant id.
    pub fn creator(&self) -> Id {
        self.id
    }
}

/// The slice of an envelope every game type shares. Used where the
/// payload type is unknown, e.g. to check whether a caller is already in
/// an active game of any type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionHeader {
    pub(crate) id: Id,
    pub(crate) game_type: String,
    pub(crate) status: SessionStatus,
}
