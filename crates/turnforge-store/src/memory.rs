//! In-process store and cache implementations.
//!
//! [`MemoryStore`] gives the same guarantees the session layer expects
//! from a relational database: per-row exclusive locks held for the life
//! of a transaction, buffered writes applied atomically on commit, and
//! rollback on drop. [`MemoryCache`] is a TTL map keyed by string.
//!
//! Both can be switched into an "unavailable" mode to exercise the
//! infrastructure-failure paths of the layers above.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use turnforge_protocol::Id;

use crate::{Cache, GameRow, Store, StoreError, Transaction};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Tables {
    games: HashMap<Id, GameRow>,
    /// participant id → game id
    players: HashMap<Id, Id>,
    last_sweep: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: Mutex<Tables>,
    /// One lock per game row. Created lazily, removed when the row is purged.
    row_locks: Mutex<HashMap<Id, Arc<Mutex<()>>>>,
    unavailable: AtomicBool,
}

impl Inner {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }

    async fn row_lock(&self, id: Id) -> Arc<Mutex<()>> {
        let mut locks = self.row_locks.lock().await;
        Arc::clone(locks.entry(id).or_default())
    }
}

/// An in-memory [`Store`].
///
/// Cheap to clone: clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with
    /// [`StoreError::Unavailable`] (or succeed again when `false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::Release);
    }

    /// Number of game rows currently stored.
    pub async fn game_count(&self) -> usize {
        self.inner.tables.lock().await.games.len()
    }

    /// Number of membership rows currently stored.
    pub async fn player_count(&self) -> usize {
        self.inner.tables.lock().await.players.len()
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        self.inner.check_available()?;
        Ok(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            guards: HashMap::new(),
            writes: Vec::new(),
        })
    }

    async fn game(&self, id: Id) -> Result<Option<GameRow>, StoreError> {
        self.inner.check_available()?;
        Ok(self.inner.tables.lock().await.games.get(&id).cloned())
    }

    async fn game_of(&self, participant: Id) -> Result<Option<GameRow>, StoreError> {
        self.inner.check_available()?;
        let tables = self.inner.tables.lock().await;
        Ok(tables
            .players
            .get(&participant)
            .and_then(|game| tables.games.get(game))
            .cloned())
    }

    async fn delete_updated_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        self.inner.check_available()?;
        let mut tables = self.inner.tables.lock().await;
        let doomed: HashSet<Id> = tables
            .games
            .values()
            .filter(|row| row.updated_on < cutoff)
            .map(|row| row.id)
            .collect();
        tables.games.retain(|id, _| !doomed.contains(id));
        tables.players.retain(|_, game| !doomed.contains(game));
        drop(tables);

        let mut locks = self.inner.row_locks.lock().await;
        locks.retain(|id, _| !doomed.contains(id));

        tracing::debug!(deleted = doomed.len(), %cutoff, "purged outdated games");
        Ok(doomed.len())
    }

    async fn claim_sweep(
        &self,
        now: DateTime<Utc>,
        min_interval: Duration,
    ) -> Result<bool, StoreError> {
        self.inner.check_available()?;
        let mut tables = self.inner.tables.lock().await;
        if let Some(last) = tables.last_sweep {
            let elapsed = now.signed_duration_since(last);
            let recent = elapsed
                .to_std()
                .map(|elapsed| elapsed < min_interval)
                // `now` before the recorded sweep: another node's clock ran ahead.
                .unwrap_or(true);
            if recent {
                return Ok(false);
            }
        }
        tables.last_sweep = Some(now);
        Ok(true)
    }

    async fn release_sweep(&self, claimed_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.check_available()?;
        let mut tables = self.inner.tables.lock().await;
        if tables.last_sweep == Some(claimed_at) {
            tables.last_sweep = None;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryTransaction
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Write {
    InsertGame(GameRow),
    UpdateGame(GameRow),
    InsertPlayer { participant: Id, game: Id },
}

/// A transaction over a [`MemoryStore`].
///
/// Holds an owned guard for every row it has locked, until dropped.
/// Dropping it without calling [`commit`](Transaction::commit) discards
/// the buffered writes.
#[derive(Debug)]
pub struct MemoryTransaction {
    inner: Arc<Inner>,
    guards: HashMap<Id, OwnedMutexGuard<()>>,
    writes: Vec<Write>,
}

impl MemoryTransaction {
    /// Latest buffered version of a game row, if this transaction wrote one.
    fn pending_game(&self, id: Id) -> Option<&GameRow> {
        self.writes.iter().rev().find_map(|w| match w {
            Write::InsertGame(row) | Write::UpdateGame(row) if row.id == id => Some(row),
            _ => None,
        })
    }

    fn pending_membership(&self, participant: Id) -> Option<Id> {
        self.writes.iter().rev().find_map(|w| match w {
            Write::InsertPlayer { participant: p, game } if *p == participant => Some(*game),
            _ => None,
        })
    }
}

impl Transaction for MemoryTransaction {
    async fn lock_game(&mut self, id: Id) -> Result<Option<GameRow>, StoreError> {
        self.inner.check_available()?;
        // Row locks are not re-entrant; a second lock on the same row from
        // the same transaction is a plain read.
        if !self.guards.contains_key(&id) {
            let lock = self.inner.row_lock(id).await;
            tracing::trace!(game_id = %id, "waiting for row lock");
            let guard = lock.lock_owned().await;
            self.guards.insert(id, guard);
        }
        if let Some(row) = self.pending_game(id) {
            return Ok(Some(row.clone()));
        }
        Ok(self.inner.tables.lock().await.games.get(&id).cloned())
    }

    async fn lock_game_of(&mut self, participant: Id) -> Result<Option<GameRow>, StoreError> {
        self.inner.check_available()?;
        let game = match self.pending_membership(participant) {
            Some(game) => Some(game),
            None => self.inner.tables.lock().await.players.get(&participant).copied(),
        };
        match game {
            Some(game) => self.lock_game(game).await,
            None => Ok(None),
        }
    }

    fn insert_game(&mut self, row: GameRow) {
        self.writes.push(Write::InsertGame(row));
    }

    fn update_game(&mut self, row: GameRow) {
        self.writes.push(Write::UpdateGame(row));
    }

    fn insert_player(&mut self, participant: Id, game: Id) {
        self.writes.push(Write::InsertPlayer { participant, game });
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.inner.check_available()?;
        let writes = std::mem::take(&mut self.writes);
        let mut tables = self.inner.tables.lock().await;

        // Validate everything first so a failing write leaves no trace.
        let mut inserted_games = HashSet::new();
        let mut inserted_players = HashSet::new();
        for write in &writes {
            match write {
                Write::InsertGame(row) => {
                    if tables.games.contains_key(&row.id) || !inserted_games.insert(row.id) {
                        return Err(StoreError::Conflict(format!("game {} already exists", row.id)));
                    }
                }
                Write::UpdateGame(row) => {
                    if !tables.games.contains_key(&row.id) && !inserted_games.contains(&row.id) {
                        return Err(StoreError::RowMissing(row.id));
                    }
                }
                Write::InsertPlayer { participant, game } => {
                    if tables.players.contains_key(participant)
                        || !inserted_players.insert(*participant)
                    {
                        return Err(StoreError::Conflict(format!(
                            "participant {participant} already registered"
                        )));
                    }
                    if !tables.games.contains_key(game) && !inserted_games.contains(game) {
                        return Err(StoreError::RowMissing(*game));
                    }
                }
            }
        }

        for write in writes {
            match write {
                Write::InsertGame(row) | Write::UpdateGame(row) => {
                    tables.games.insert(row.id, row);
                }
                Write::InsertPlayer { participant, game } => {
                    tables.players.insert(participant, game);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self) {
        tracing::trace!(
            locked = self.guards.len(),
            discarded = self.writes.len(),
            "transaction rolled back"
        );
    }
}

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// An in-memory [`Cache`] with per-entry expiry.
///
/// Uses Tokio's clock, so tests running with a paused clock can advance
/// past a TTL deterministically.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with
    /// [`StoreError::Unavailable`] (or succeed again when `false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    /// Number of entries held, expired ones included until pruned.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("memory cache switched off".into()));
        }
        Ok(())
    }
}

impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        // Keys of purged games are never read again.
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: Id, serialized: &[u8]) -> GameRow {
        GameRow {
            id,
            game_type: "test".into(),
            updated_on: Utc::now(),
            serialized: serialized.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_commit_applies_buffered_writes() {
        let store = MemoryStore::new();
        let id = Id::generate();

        let mut tx = store.begin().await.unwrap();
        tx.insert_game(row(id, b"v1"));
        tx.insert_player(id, id);
        tx.commit().await.unwrap();

        assert_eq!(store.game(id).await.unwrap().unwrap().serialized, b"v1");
        assert_eq!(store.game_of(id).await.unwrap().unwrap().id, id);
    }

    #[tokio::test]
    async fn test_drop_discards_buffered_writes() {
        let store = MemoryStore::new();
        let id = Id::generate();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_game(row(id, b"v1"));
        }

        assert!(store.game(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_duplicate_game_returns_conflict() {
        let store = MemoryStore::new();
        let id = Id::generate();
        let mut tx = store.begin().await.unwrap();
        tx.insert_game(row(id, b"v1"));
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_game(row(id, b"v2"));
        let result = tx.commit().await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.game(id).await.unwrap().unwrap().serialized, b"v1");
    }

    #[tokio::test]
    async fn test_commit_update_of_missing_row_returns_row_missing() {
        let store = MemoryStore::new();
        let id = Id::generate();
        let mut tx = store.begin().await.unwrap();
        tx.update_game(row(id, b"v1"));

        let result = tx.commit().await;

        assert!(matches!(result, Err(StoreError::RowMissing(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_lock_game_same_row_twice_does_not_deadlock() {
        let store = MemoryStore::new();
        let id = Id::generate();
        let mut tx = store.begin().await.unwrap();
        tx.insert_game(row(id, b"v1"));
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.lock_game(id).await.unwrap();
        let again = tx.lock_game(id).await.unwrap();

        assert!(again.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_keeps_row_lock_until_drop() {
        let store = MemoryStore::new();
        let id = Id::generate();
        let mut tx = store.begin().await.unwrap();
        tx.insert_game(row(id, b"v1"));
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.lock_game(id).await.unwrap();
        tx.update_game(row(id, b"v2"));
        tx.commit().await.unwrap();

        let mut other = store.begin().await.unwrap();
        let waited = tokio::time::timeout(Duration::from_secs(1), other.lock_game(id)).await;
        assert!(waited.is_err());

        drop(tx);
        let seen = other.lock_game(id).await.unwrap().unwrap();
        assert_eq!(seen.serialized, b"v2");
    }

    #[tokio::test]
    async fn test_rollback_discards_writes_and_releases_lock() {
        let store = MemoryStore::new();
        let id = Id::generate();
        let mut tx = store.begin().await.unwrap();
        tx.insert_game(row(id, b"v1"));
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.lock_game(id).await.unwrap();
        tx.update_game(row(id, b"v2"));
        tx.rollback().await;

        let mut other = store.begin().await.unwrap();
        let seen = other.lock_game(id).await.unwrap().unwrap();
        assert_eq!(seen.serialized, b"v1");
    }

    #[tokio::test]
    async fn test_delete_updated_before_cascades_to_players() {
        let store = MemoryStore::new();
        let old = Id::generate();
        let fresh = Id::generate();
        let mut old_row = row(old, b"old");
        old_row.updated_on = Utc::now() - chrono::Duration::hours(2);

        let mut tx = store.begin().await.unwrap();
        tx.insert_game(old_row);
        tx.insert_player(old, old);
        tx.insert_game(row(fresh, b"fresh"));
        tx.insert_player(fresh, fresh);
        tx.commit().await.unwrap();

        let deleted = store
            .delete_updated_before(Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(store.game_count().await, 1);
        assert_eq!(store.player_count().await, 1);
        assert!(store.game_of(old).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_sweep_within_interval_returns_false() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let interval = Duration::from_secs(60);

        assert!(store.claim_sweep(now, interval).await.unwrap());
        assert!(!store.claim_sweep(now + chrono::Duration::seconds(30), interval).await.unwrap());
        assert!(store.claim_sweep(now + chrono::Duration::seconds(61), interval).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_sweep_allows_immediate_claim() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let interval = Duration::from_secs(60);

        assert!(store.claim_sweep(now, interval).await.unwrap());
        store.release_sweep(now).await.unwrap();

        assert!(store.claim_sweep(now + chrono::Duration::seconds(1), interval).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_sweep_keeps_newer_claim() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let interval = Duration::from_secs(60);

        assert!(store.claim_sweep(now, interval).await.unwrap());
        store.release_sweep(now - chrono::Duration::hours(1)).await.unwrap();

        assert!(!store.claim_sweep(now + chrono::Duration::seconds(1), interval).await.unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_begin() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let result = store.begin().await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("k", b"v".to_vec(), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_set_overwrites_entry() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(10);
        cache.set_with_ttl("k", b"v1".to_vec(), ttl).await.unwrap();
        cache.set_with_ttl("k", b"v2".to_vec(), ttl).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some(b"v2".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_set_prunes_expired_entries() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("purged", b"v".to_vec(), Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        cache
            .set_with_ttl("fresh", b"v".to_vec(), Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("fresh").await.unwrap(), Some(b"v".to_vec()));
    }
}
