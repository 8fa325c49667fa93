//! Store and cache collaborators for Turnforge.
//!
//! Provides the [`Store`], [`Transaction`] and [`Cache`] traits that the
//! session layer is written against, so the relational database and the
//! key/value cache can be swapped without touching game code.
//!
//! # Tables
//!
//! The store keeps two logical tables:
//!
//! - `games`: one [`GameRow`] per session (id, type tag, last update,
//!   serialized envelope).
//! - `players`: the membership index `participant id → game id`, used to
//!   find a caller's active game in O(1). Deleting a game cascades to its
//!   membership rows.
//!
//! # Feature Flags
//!
//! - `memory` (default): in-process [`MemoryStore`] and [`MemoryCache`]

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "memory")]
mod memory;

pub use error::StoreError;
#[cfg(feature = "memory")]
pub use memory::{MemoryCache, MemoryStore, MemoryTransaction};

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use turnforge_protocol::Id;

/// A persisted session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRow {
    /// Session id (primary key).
    pub id: Id,
    /// Game type tag; immutable after insert.
    pub game_type: String,
    /// Timestamp of the last committed mutation.
    pub updated_on: DateTime<Utc>,
    /// Codec output for the full envelope.
    pub serialized: Vec<u8>,
}

/// The durable, transactional source of truth.
///
/// Reads through the store itself are unlocked snapshots. Anything that
/// intends to write goes through [`Store::begin`] and a [`Transaction`].
pub trait Store: Send + Sync + 'static {
    /// The transaction type handed out by [`Store::begin`].
    type Tx: Transaction;

    /// Opens a new transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, StoreError>> + Send;

    /// Reads a game row without locking it.
    fn game(&self, id: Id) -> impl Future<Output = Result<Option<GameRow>, StoreError>> + Send;

    /// Reads the game a participant belongs to, without locking it.
    fn game_of(
        &self,
        participant: Id,
    ) -> impl Future<Output = Result<Option<GameRow>, StoreError>> + Send;

    /// Deletes every game last updated strictly before `cutoff`, together
    /// with its membership rows. Returns how many games were removed.
    fn delete_updated_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Atomically claims the right to run the expiry sweep.
    ///
    /// Returns `true` (and records `now` as the last sweep) when no sweep
    /// has been recorded within `min_interval` before `now`; `false`
    /// otherwise. Shared by every process using the same store.
    fn claim_sweep(
        &self,
        now: DateTime<Utc>,
        min_interval: Duration,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Withdraws a claim made by [`claim_sweep`](Self::claim_sweep) at
    /// `claimed_at`, so the next sweep may run at once. Called when the
    /// sweep itself failed. A newer claim is left untouched.
    fn release_sweep(
        &self,
        claimed_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// An open read-modify-write transaction.
///
/// Row locks taken by [`lock_game`](Self::lock_game) are held until the
/// transaction is rolled back or dropped, including after a successful
/// [`commit`](Self::commit): work that must be ordered with the commit
/// (the cache write) runs before the locks go. Writes are buffered and
/// applied atomically by `commit`. Dropping an uncommitted transaction is
/// a rollback, which is what makes `?` and panics inside game logic safe.
pub trait Transaction: Send {
    /// Locks a game row exclusively (`SELECT … FOR UPDATE`) and reads it.
    fn lock_game(
        &mut self,
        id: Id,
    ) -> impl Future<Output = Result<Option<GameRow>, StoreError>> + Send;

    /// Looks up the participant's game through the membership index,
    /// locks it and reads it.
    fn lock_game_of(
        &mut self,
        participant: Id,
    ) -> impl Future<Output = Result<Option<GameRow>, StoreError>> + Send;

    /// Buffers the insert of a new game row.
    fn insert_game(&mut self, row: GameRow);

    /// Buffers an update of an existing game row.
    fn update_game(&mut self, row: GameRow);

    /// Buffers the insert of a membership index row.
    fn insert_player(&mut self, participant: Id, game: Id);

    /// Applies all buffered writes atomically. The row locks stay held
    /// until the transaction is dropped.
    fn commit(&mut self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Discards all buffered writes and releases the locks.
    fn rollback(self) -> impl Future<Output = ()> + Send;
}

/// A key/value read cache with per-entry TTL.
///
/// Entries are never deleted explicitly; they are overwritten on every
/// successful write and otherwise age out.
pub trait Cache: Send + Sync + 'static {
    /// Returns the cached bytes for `key`, or `None` on a miss.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    /// Stores `value` under `key` for `ttl`.
    fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
