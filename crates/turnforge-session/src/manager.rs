//! Session manager: every transactional operation on a session envelope.
//!
//! Each mutating operation follows the same shape:
//!
//! ```text
//! begin ─→ lock row ─→ decode ─→ validate ─→ mutate ─→ encode
//!                                    │                    │
//!                             (reject: rollback)    update + commit
//!                                                         │
//!                                                  cache.set(bytes)
//!                                                         │
//!                                                    release lock
//! ```
//!
//! The row lock is held from the read until the cache write that follows
//! the commit, so two mutations of the same session serialize and their
//! cache writes land in commit order. A rejection rolls the transaction
//! back explicitly; any other early return (or a panic in game logic)
//! drops it, which rolls back as well. The cache is written only after a
//! successful commit, with the exact bytes that went to the store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use turnforge_protocol::{Codec, Id, JsonCodec};
use turnforge_store::{Cache, GameRow, Store, Transaction};

use crate::identity::{Caller, IdSource, SortableIds};
use crate::payload::{GamePayload, TurnContext};
use crate::session::{Session, SessionConfig, SessionHeader, SessionStatus};
use crate::SessionError;

/// The game a caller is currently playing, as returned by
/// [`SessionManager::active`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGame {
    pub game_type: String,
    pub id: Id,
}

/// Owns the collaborators and runs the session lifecycle against them.
///
/// One manager serves every game type: the payload type is chosen per
/// call. Share it across tasks behind an `Arc`.
pub struct SessionManager<S, K, C = JsonCodec> {
    store: S,
    cache: K,
    codec: C,
    ids: Arc<dyn IdSource>,
    config: SessionConfig,
}

impl<S: Store, K: Cache> SessionManager<S, K, JsonCodec> {
    /// Creates a manager that serializes envelopes as JSON.
    pub fn new(store: S, cache: K, config: SessionConfig) -> Self {
        Self::with_codec(store, cache, JsonCodec, config)
    }
}

impl<S: Store, K: Cache, C: Codec> SessionManager<S, K, C> {
    /// Creates a manager with a custom codec.
    pub fn with_codec(store: S, cache: K, codec: C, config: SessionConfig) -> Self {
        Self {
            store,
            cache,
            codec,
            ids: Arc::new(SortableIds),
            config,
        }
    }

    /// Replaces the id source used for session and participant ids.
    pub fn with_id_source(mut self, ids: impl IdSource) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &K {
        &self.cache
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Creates a new game with the caller as its only player.
    ///
    /// The session id doubles as the creator's new participant id, which
    /// is written back into `caller`.
    ///
    /// # Errors
    /// - [`SessionError::InvalidGameType`]: `P::GAME_TYPE` is empty or too long
    /// - [`SessionError::AlreadyInActiveGame`]: the caller plays in an active game
    /// - [`SessionError::Store`], [`SessionError::Protocol`]: infrastructure failure
    pub async fn create<P: GamePayload>(
        &self,
        caller: &mut Caller,
    ) -> Result<Session<P>, SessionError> {
        self.validate_game_type(P::GAME_TYPE)?;
        self.ensure_not_active(caller, "create").await?;

        let id = self.ids.new_id();
        let now = Utc::now();
        let session = Session {
            id,
            game_type: P::GAME_TYPE.to_string(),
            created_on: now,
            updated_on: now,
            status: SessionStatus::NotStarted,
            players: vec![id],
            turn: 0,
            payload: P::new_game(),
        };

        let bytes = self.codec.encode(&session)?;
        let mut tx = self.store.begin().await?;
        tx.insert_game(self.row(&session, bytes.clone()));
        tx.insert_player(id, id);
        self.commit_and_publish(tx, &session, bytes).await?;

        caller.reissue(id);
        tracing::info!(game_id = %id, game_type = P::GAME_TYPE, "game created");
        Ok(session)
    }

    /// Adds the caller to a game that hasn't started yet.
    ///
    /// The caller receives a freshly issued participant id.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyInActiveGame`]: the caller plays in an active game
    /// - [`SessionError::NotFound`], [`SessionError::TypeMismatch`]: no such
    ///   game of type `P`
    /// - [`SessionError::AlreadyStarted`]: the game is past NotStarted
    /// - [`SessionError::GameFull`]: the game holds `max_players` already
    /// - [`SessionError::Store`], [`SessionError::Protocol`]: infrastructure failure
    pub async fn join<P: GamePayload>(
        &self,
        caller: &mut Caller,
        game: Id,
    ) -> Result<Session<P>, SessionError> {
        self.ensure_not_active(caller, "join").await?;

        let participant = self.ids.new_id();
        let mut tx = self.store.begin().await?;
        let session = match self.admit::<P>(&mut tx, game, participant).await {
            Ok(session) => session,
            Err(err) => return reject(tx, err).await,
        };

        let bytes = self.codec.encode(&session)?;
        tx.update_game(self.row(&session, bytes.clone()));
        tx.insert_player(participant, game);
        self.commit_and_publish(tx, &session, bytes).await?;

        caller.reissue(participant);
        tracing::info!(
            game_id = %game,
            player = %participant,
            players = session.players.len(),
            "player joined"
        );
        Ok(session)
    }

    /// Starts the caller's game. Only the creator may start it.
    ///
    /// With `randomize`, the player order is shuffled before it is fixed.
    ///
    /// # Errors
    /// - [`SessionError::NotInActiveGame`]: the caller has no active game
    /// - [`SessionError::AlreadyStarted`]: the game is past NotStarted
    /// - [`SessionError::BelowMinPlayers`]: fewer than `min_players` joined
    /// - [`SessionError::NotCreator`]: the caller didn't create the game
    /// - [`SessionError::TypeMismatch`]: the caller's game isn't of type `P`
    /// - [`SessionError::Store`], [`SessionError::Protocol`]: infrastructure failure
    pub async fn start<P: GamePayload>(
        &self,
        caller: &Caller,
        randomize: bool,
    ) -> Result<Session<P>, SessionError> {
        let me = caller.participant().ok_or(SessionError::NotInActiveGame)?;

        let mut tx = self.store.begin().await?;
        let session = match self.ready::<P>(&mut tx, me, randomize).await {
            Ok(session) => session,
            Err(err) => return reject(tx, err).await,
        };

        let bytes = self.codec.encode(&session)?;
        tx.update_game(self.row(&session, bytes.clone()));
        self.commit_and_publish(tx, &session, bytes).await?;

        tracing::info!(
            game_id = %session.id,
            players = session.players.len(),
            randomize,
            "game started"
        );
        Ok(session)
    }

    /// Applies one turn of the caller's game.
    ///
    /// `mutate` runs with the row locked. If it returns an error (or
    /// panics) nothing is written. On success the turn counter advances
    /// by one plus however many turns `mutate` skipped.
    ///
    /// # Errors
    /// - [`SessionError::NotInActiveGame`]: the caller has no active game
    /// - [`SessionError::NotStarted`]: the game hasn't started
    /// - [`SessionError::NotYourTurn`]: another player is to move
    /// - [`SessionError::Rule`]: `mutate` rejected the move
    /// - [`SessionError::TypeMismatch`]: the caller's game isn't of type `P`
    /// - [`SessionError::Store`], [`SessionError::Protocol`]: infrastructure failure
    pub async fn take_turn<P, F, E>(
        &self,
        caller: &Caller,
        mutate: F,
    ) -> Result<Session<P>, SessionError>
    where
        P: GamePayload,
        F: FnOnce(&mut TurnContext<'_, P>) -> Result<(), E> + Send,
        E: std::error::Error + Send + Sync + 'static,
    {
        let me = caller.participant().ok_or(SessionError::NotInActiveGame)?;

        let mut tx = self.store.begin().await?;
        let (session, skipped) = match self.play::<P, F, E>(&mut tx, me, mutate).await {
            Ok(played) => played,
            Err(err) => return reject(tx, err).await,
        };

        let bytes = self.codec.encode(&session)?;
        tx.update_game(self.row(&session, bytes.clone()));
        self.commit_and_publish(tx, &session, bytes).await?;

        tracing::debug!(
            game_id = %session.id,
            player = %me,
            turn = session.turn,
            skipped,
            "turn taken"
        );
        if session.status == SessionStatus::Finished {
            tracing::info!(game_id = %session.id, turn = session.turn, "game finished");
        }
        Ok(session)
    }

    /// Abandons the caller's active game.
    ///
    /// Returns `None` without writing anything if the caller has no
    /// NotStarted or Started game.
    pub async fn abandon<P: GamePayload>(
        &self,
        caller: &Caller,
    ) -> Result<Option<Session<P>>, SessionError> {
        let Some(me) = caller.participant() else {
            return Ok(None);
        };

        let mut tx = self.store.begin().await?;
        let mut session: Session<P> = match self.lock_active(&mut tx, me).await {
            Ok(session) => session,
            Err(SessionError::NotInActiveGame) => {
                tx.rollback().await;
                return Ok(None);
            }
            Err(err) => return reject(tx, err).await,
        };
        if let Err(err) = session.transition(SessionStatus::Abandoned) {
            return reject(tx, err).await;
        }
        touch(&mut session);

        let bytes = self.codec.encode(&session)?;
        tx.update_game(self.row(&session, bytes.clone()));
        self.commit_and_publish(tx, &session, bytes).await?;

        tracing::info!(game_id = %session.id, player = %me, "game abandoned");
        Ok(Some(session))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Reads a game without locking it, cache first.
    ///
    /// With `updated_after`, returns `None` unless the game changed
    /// strictly after that instant. An unreadable cache entry is skipped
    /// in favour of the store.
    pub async fn get<P: GamePayload>(
        &self,
        id: Id,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Option<Session<P>>, SessionError> {
        let key = cache_key(P::GAME_TYPE, id);
        let cached = match self.cache.get(&key).await {
            Ok(hit) => hit,
            Err(err) => {
                tracing::warn!(%key, %err, "cache read failed, falling back to store");
                None
            }
        };
        let cached: Option<Session<P>> =
            cached.and_then(|bytes| match self.codec.decode(&bytes) {
                Ok(session) => Some(session),
                Err(err) => {
                    tracing::warn!(%key, %err, "cached game unreadable, falling back to store");
                    None
                }
            });

        let session = match cached {
            Some(session) => {
                tracing::debug!(%key, "cache hit");
                session
            }
            None => {
                tracing::debug!(%key, "cache miss");
                let row = self.store.game(id).await?.ok_or(SessionError::NotFound(id))?;
                self.decode_row(&row)?
            }
        };

        if let Some(after) = updated_after {
            if session.updated_on <= after {
                return Ok(None);
            }
        }
        Ok(Some(session))
    }

    /// The caller's NotStarted or Started game, if any.
    pub async fn active(&self, caller: &Caller) -> Result<Option<ActiveGame>, SessionError> {
        Ok(self
            .active_header(caller)
            .await?
            .map(|header| ActiveGame {
                game_type: header.game_type,
                id: header.id,
            }))
    }

    // -----------------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------------

    /// Deletes every game not updated within `expiry`.
    ///
    /// Does nothing and returns `None` if any process sharing the store
    /// already swept within `min_interval`. Otherwise returns how many
    /// games were deleted. A failed sweep doesn't count towards the
    /// interval.
    pub async fn delete_outdated(
        &self,
        expiry: Duration,
        min_interval: Duration,
    ) -> Result<Option<usize>, SessionError> {
        let now = Utc::now();
        if !self.store.claim_sweep(now, min_interval).await? {
            tracing::debug!("sweep skipped, ran within min interval");
            return Ok(None);
        }

        let cutoff = TimeDelta::from_std(expiry)
            .ok()
            .and_then(|expiry| now.checked_sub_signed(expiry))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let deleted = match self.store.delete_updated_before(cutoff).await {
            Ok(deleted) => deleted,
            Err(err) => {
                if let Err(release) = self.store.release_sweep(now).await {
                    tracing::warn!(error = %release, "sweep claim not released");
                }
                return Err(err.into());
            }
        };
        tracing::info!(deleted, %cutoff, "outdated games deleted");
        Ok(Some(deleted))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn validate_game_type(&self, game_type: &str) -> Result<(), SessionError> {
        let len = game_type.chars().count();
        if len == 0 || len > self.config.game_type_max_len {
            return Err(SessionError::InvalidGameType(game_type.to_string()));
        }
        Ok(())
    }

    async fn active_header(&self, caller: &Caller) -> Result<Option<SessionHeader>, SessionError> {
        let Some(me) = caller.participant() else {
            return Ok(None);
        };
        let Some(row) = self.store.game_of(me).await? else {
            return Ok(None);
        };
        let header: SessionHeader = self.codec.decode(&row.serialized)?;
        Ok(header.status.is_active().then_some(header))
    }

    /// Read without a lock: taking a second row lock here could deadlock
    /// against a caller joining in the opposite direction.
    async fn ensure_not_active(
        &self,
        caller: &Caller,
        verb: &'static str,
    ) -> Result<(), SessionError> {
        match self.active_header(caller).await? {
            Some(header) => Err(SessionError::AlreadyInActiveGame {
                verb,
                game: header.id,
                game_type: header.game_type,
            }),
            None => Ok(()),
        }
    }

    /// Locks `game` and appends `participant` to its players.
    async fn admit<P: GamePayload>(
        &self,
        tx: &mut S::Tx,
        game: Id,
        participant: Id,
    ) -> Result<Session<P>, SessionError> {
        let row = tx.lock_game(game).await?.ok_or(SessionError::NotFound(game))?;
        let mut session: Session<P> = self.decode_row(&row)?;

        if session.status != SessionStatus::NotStarted {
            return Err(SessionError::AlreadyStarted(game));
        }
        let max_players = P::rules().max_players;
        if session.players.len() >= max_players {
            return Err(SessionError::GameFull(max_players));
        }

        session.players.push(participant);
        touch(&mut session);
        Ok(session)
    }

    /// Locks the game `me` created and moves it to Started.
    async fn ready<P: GamePayload>(
        &self,
        tx: &mut S::Tx,
        me: Id,
        randomize: bool,
    ) -> Result<Session<P>, SessionError> {
        let mut session: Session<P> = self.lock_active(tx, me).await?;

        if session.status != SessionStatus::NotStarted {
            return Err(SessionError::AlreadyStarted(session.id));
        }
        let min_players = P::rules().min_players;
        if session.players.len() < min_players {
            return Err(SessionError::BelowMinPlayers(min_players));
        }
        if session.creator() != me {
            return Err(SessionError::NotCreator);
        }

        if randomize {
            session.players.shuffle(&mut rand::rng());
        }
        session.payload.setup(&session.players);
        session.transition(SessionStatus::Started)?;
        touch(&mut session);
        Ok(session)
    }

    /// Locks the game `me` plays in and applies `mutate` as their turn.
    /// Returns the new envelope and the number of turns skipped.
    async fn play<P, F, E>(
        &self,
        tx: &mut S::Tx,
        me: Id,
        mutate: F,
    ) -> Result<(Session<P>, u32), SessionError>
    where
        P: GamePayload,
        F: FnOnce(&mut TurnContext<'_, P>) -> Result<(), E> + Send,
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut session: Session<P> = self.lock_active(tx, me).await?;

        if session.status != SessionStatus::Started {
            return Err(SessionError::NotStarted(session.id));
        }
        let count = session.players.len();
        let idx = P::current_player_index(session.turn, count);
        if session.players.get(idx) != Some(&me) {
            return Err(SessionError::NotYourTurn);
        }

        let mut ctx = TurnContext::new(session.turn, count, &mut session.payload);
        if let Err(err) = mutate(&mut ctx) {
            tracing::debug!(game_id = %session.id, turn = session.turn, %err, "turn rejected");
            return Err(SessionError::Rule(Box::new(err)));
        }
        let skipped = ctx.skipped();
        let finished = ctx.is_finished();

        session.turn += skipped + 1;
        if finished {
            session.transition(SessionStatus::Finished)?;
        }
        touch(&mut session);
        Ok((session, skipped))
    }

    /// Locks and decodes the game `me` plays in, if it is still active.
    async fn lock_active<P: GamePayload>(
        &self,
        tx: &mut S::Tx,
        me: Id,
    ) -> Result<Session<P>, SessionError> {
        let row = tx
            .lock_game_of(me)
            .await?
            .ok_or(SessionError::NotInActiveGame)?;
        tracing::trace!(game_id = %row.id, player = %me, "row locked");
        let session: Session<P> = self.decode_row(&row)?;
        if !session.is_active() || !session.is_player(me) {
            return Err(SessionError::NotInActiveGame);
        }
        Ok(session)
    }

    fn decode_row<P: GamePayload>(&self, row: &GameRow) -> Result<Session<P>, SessionError> {
        if row.game_type != P::GAME_TYPE {
            return Err(SessionError::TypeMismatch {
                expected: P::GAME_TYPE.to_string(),
                found: row.game_type.clone(),
            });
        }
        Ok(self.codec.decode(&row.serialized)?)
    }

    fn row<P>(&self, session: &Session<P>, serialized: Vec<u8>) -> GameRow {
        GameRow {
            id: session.id,
            game_type: session.game_type.clone(),
            updated_on: session.updated_on,
            serialized,
        }
    }

    /// Commits `tx`, then writes `bytes` to the cache before the row lock
    /// is released, so cache writes for one game land in commit order.
    async fn commit_and_publish<P>(
        &self,
        mut tx: S::Tx,
        session: &Session<P>,
        bytes: Vec<u8>,
    ) -> Result<(), SessionError> {
        tx.commit().await?;
        self.publish(session, bytes).await;
        drop(tx);
        Ok(())
    }

    /// Overwrites the cache entry after a commit. A failure here leaves a
    /// stale entry that ages out or is overwritten by the next write.
    async fn publish<P>(&self, session: &Session<P>, bytes: Vec<u8>) {
        let key = cache_key(&session.game_type, session.id);
        let ttl = self.config.cache_ttl;
        if let Err(err) = self.cache.set_with_ttl(&key, bytes, ttl).await {
            tracing::warn!(%key, %err, "cache write failed after commit");
        }
    }
}

/// Rolls `tx` back and returns `err`.
async fn reject<T, X: Transaction>(tx: X, err: SessionError) -> Result<T, SessionError> {
    tx.rollback().await;
    Err(err)
}

fn cache_key(game_type: &str, id: Id) -> String {
    format!("{game_type}:{id}")
}

/// Moves `updated_on` forward, strictly past its previous value.
fn touch<P>(session: &mut Session<P>) {
    let now = Utc::now();
    session.updated_on = if now > session.updated_on {
        now
    } else {
        session.updated_on + TimeDelta::microseconds(1)
    };
}
