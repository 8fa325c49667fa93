//! # Turnforge
//!
//! Server-side engine for turn-based multiplayer games.
//!
//! Turnforge keeps every game in a generic session envelope (players,
//! turn counter, status) stored transactionally, and lets each game type
//! supply only its payload and rules. Blockers, a four-colour polyomino
//! placement game, ships as the first game type.
//!
//! ```text
//! Blockers service  ← typed operations, placement errors
//!     ↕
//! SessionManager    ← row locks, arbitration, cache discipline
//!     ↕
//! Store + Cache     ← transactions, membership index, TTL cache
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use turnforge::prelude::*;
//!
//! # async fn run() -> Result<(), TurnforgeError> {
//! let tf = TurnforgeBuilder::new()
//!     .build(MemoryStore::new(), MemoryCache::new())
//!     .await;
//! let blockers = tf.blockers();
//!
//! let mut alice = Caller::anonymous();
//! let mut bob = Caller::anonymous();
//! let game = blockers.new_game(&mut alice).await?;
//! blockers.join(&mut bob, game.id).await?;
//! blockers.start(&alice, false).await?;
//! blockers.take_turn(&alice, TurnArgs::place(0, 0)).await?;
//! # Ok(())
//! # }
//! ```

mod blockers;
mod config;
mod error;
mod server;

pub use blockers::{Blockers, BlockersSession};
pub use config::TurnforgeConfig;
pub use error::TurnforgeError;
pub use server::{Turnforge, TurnforgeBuilder};

pub use turnforge_blockers as game;
pub use turnforge_protocol as protocol;
pub use turnforge_session as session;
pub use turnforge_store as store;
pub use turnforge_sweep as sweep;

/// Installs a `tracing` subscriber that honours `RUST_LOG`, defaulting
/// to `info`. Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

pub mod prelude {
    pub use crate::{
        Blockers, BlockersSession, Turnforge, TurnforgeBuilder, TurnforgeConfig, TurnforgeError,
    };
    pub use turnforge_blockers::{BlockersGame, PlacementError, Quadrant, TurnArgs};
    pub use turnforge_protocol::Id;
    pub use turnforge_session::{Caller, GamePayload, SessionError, SessionStatus};
    pub use turnforge_store::{MemoryCache, MemoryStore};
}
