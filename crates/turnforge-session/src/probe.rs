//! Whose-turn probe: reads one game on behalf of several callers at once.
//!
//! Each caller's read runs on its own task; a semaphore bounds how many
//! run at the same time. The group fails as a whole if any read fails.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use turnforge_protocol::{Codec, Id};
use turnforge_store::{Cache, Store};

use crate::{Caller, GamePayload, SessionError, SessionManager};

/// Returns the index into `callers` of the caller whose turn it is in
/// `game`, or `None` if it's nobody's (game not started or over, or the
/// mover isn't among `callers`).
///
/// At most `concurrency` reads run at once (a value of 0 is treated
/// as 1).
pub async fn whose_turn<P, S, K, C>(
    manager: Arc<SessionManager<S, K, C>>,
    game: Id,
    callers: &[Caller],
    concurrency: usize,
) -> Result<Option<usize>, SessionError>
where
    P: GamePayload,
    S: Store,
    K: Cache,
    C: Codec,
{
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (idx, caller) in callers.iter().copied().enumerate() {
        let manager = Arc::clone(&manager);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            // never closed
            let _permit = permits.acquire_owned().await.ok();
            let session = manager
                .get::<P>(game, None)
                .await?
                .ok_or(SessionError::NotFound(game))?;
            let mine = caller
                .participant()
                .is_some_and(|me| session.is_turn_of(me));
            Ok::<_, SessionError>((idx, mine))
        });
    }

    let mut mover = None;
    while let Some(joined) = tasks.join_next().await {
        let (idx, mine) = joined??;
        if mine {
            mover = Some(idx);
        }
    }
    tracing::debug!(game_id = %game, callers = callers.len(), ?mover, "whose turn probed");
    Ok(mover)
}
