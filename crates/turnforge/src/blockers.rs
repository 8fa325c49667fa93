//! The Blockers game service: typed lifecycle operations for one game
//! type, with rule violations surfaced as [`PlacementError`]s.
//!
//! [`PlacementError`]: turnforge_blockers::PlacementError

use std::sync::Arc;

use chrono::{DateTime, Utc};
use turnforge_blockers::{BlockersGame, TurnArgs, take_turn};
use turnforge_protocol::Id;
use turnforge_session::{ActiveGame, Caller, Session, SessionManager, whose_turn};
use turnforge_store::{Cache, Store};

use crate::TurnforgeError;

/// A Blockers session.
pub type BlockersSession = Session<BlockersGame>;

/// Blockers operations on a shared [`SessionManager`]. Cheap to clone.
pub struct Blockers<S, K> {
    manager: Arc<SessionManager<S, K>>,
    probe_concurrency: usize,
}

impl<S, K> Clone for Blockers<S, K> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            probe_concurrency: self.probe_concurrency,
        }
    }
}

impl<S: Store, K: Cache> Blockers<S, K> {
    pub fn new(manager: Arc<SessionManager<S, K>>, probe_concurrency: usize) -> Self {
        Self {
            manager,
            probe_concurrency,
        }
    }

    /// Creates a game. `caller` receives its participant id.
    pub async fn new_game(&self, caller: &mut Caller) -> Result<BlockersSession, TurnforgeError> {
        self.manager
            .create::<BlockersGame>(caller)
            .await
            .map_err(TurnforgeError::from_session)
    }

    /// Joins `game`. `caller` receives its participant id.
    pub async fn join(
        &self,
        caller: &mut Caller,
        game: Id,
    ) -> Result<BlockersSession, TurnforgeError> {
        self.manager
            .join::<BlockersGame>(caller, game)
            .await
            .map_err(TurnforgeError::from_session)
    }

    /// Starts the caller's game, optionally shuffling the player order.
    pub async fn start(
        &self,
        caller: &Caller,
        randomize: bool,
    ) -> Result<BlockersSession, TurnforgeError> {
        self.manager
            .start::<BlockersGame>(caller, randomize)
            .await
            .map_err(TurnforgeError::from_session)
    }

    /// Places a piece, or passes, for the caller.
    pub async fn take_turn(
        &self,
        caller: &Caller,
        args: TurnArgs,
    ) -> Result<BlockersSession, TurnforgeError> {
        self.manager
            .take_turn::<BlockersGame, _, _>(caller, move |ctx| take_turn(ctx, &args))
            .await
            .map_err(TurnforgeError::from_session)
    }

    /// Abandons the caller's active game, if any.
    pub async fn abandon(
        &self,
        caller: &Caller,
    ) -> Result<Option<BlockersSession>, TurnforgeError> {
        self.manager
            .abandon::<BlockersGame>(caller)
            .await
            .map_err(TurnforgeError::from_session)
    }

    /// Reads a game; `None` if it hasn't changed since `updated_after`.
    pub async fn get(
        &self,
        game: Id,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Option<BlockersSession>, TurnforgeError> {
        self.manager
            .get::<BlockersGame>(game, updated_after)
            .await
            .map_err(TurnforgeError::from_session)
    }

    /// The caller's active game of any type.
    pub async fn active(&self, caller: &Caller) -> Result<Option<ActiveGame>, TurnforgeError> {
        Ok(self.manager.active(caller).await?)
    }

    /// Index into `callers` of whoever moves next in `game`.
    pub async fn whose_turn(
        &self,
        game: Id,
        callers: &[Caller],
    ) -> Result<Option<usize>, TurnforgeError> {
        Ok(whose_turn::<BlockersGame, _, _, _>(
            Arc::clone(&self.manager),
            game,
            callers,
            self.probe_concurrency,
        )
        .await?)
    }
}
