//! Caller identity and id allocation.
//!
//! Turnforge doesn't authenticate anyone. The layer above resolves the
//! request's cookie or token into a [`Caller`] and hands it in; the
//! session manager only reads the caller's current participant id and,
//! on create/join, replaces it with a freshly issued one.
//!
//! Issuing a new participant id per game keeps an account's finished
//! games from ever colliding with its next one in the membership index.

use turnforge_protocol::Id;

/// Source of globally unique, sortable ids.
///
/// `Send + Sync + 'static` because one source is shared by every task.
pub trait IdSource: Send + Sync + 'static {
    /// Returns a new id, greater than any id this source returned before.
    fn new_id(&self) -> Id;
}

/// The default [`IdSource`]: time-ordered UUIDv7 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortableIds;

impl IdSource for SortableIds {
    fn new_id(&self) -> Id {
        Id::generate()
    }
}

/// The authenticated participant behind an in-flight action.
///
/// A caller with no participant id has never created or joined a game
/// (or the layer above lost its session). It can create or join, but
/// every other operation treats it as not being in an active game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caller {
    participant: Option<Id>,
}

impl Caller {
    /// A caller that has no participant id yet.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A caller presenting a previously issued participant id.
    pub fn with_participant(participant: Id) -> Self {
        Self {
            participant: Some(participant),
        }
    }

    /// The caller's current participant id, if any.
    pub fn participant(&self) -> Option<Id> {
        self.participant
    }

    /// Replaces the participant id after a successful create or join.
    pub(crate) fn reissue(&mut self, participant: Id) {
        self.participant = Some(participant);
    }
}
