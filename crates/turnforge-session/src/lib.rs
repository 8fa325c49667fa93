//! Game session lifecycle management for Turnforge.
//!
//! This crate owns the generic envelope every turn-based game lives in
//! and the transactional operations that move it through its lifecycle:
//!
//! 1. **Identity**: who is calling ([`Caller`]) and where fresh ids come
//!    from ([`IdSource`])
//! 2. **Envelope**: players, turn counter and status around an opaque
//!    payload ([`Session`], [`SessionStatus`])
//! 3. **Payload capability**: what a game type must provide
//!    ([`GamePayload`], [`TurnContext`])
//! 4. **Lifecycle**: create, join, start, take turn, abandon, get, sweep
//!    ([`SessionManager`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Game rules (above)  ← mutate the payload inside a TurnContext
//!     ↕
//! Session Layer (this crate)  ← arbitration, row locks, cache discipline
//!     ↕
//! Store / Protocol (below)  ← transactions, cache, bytes
//! ```

mod error;
mod identity;
mod manager;
mod payload;
mod probe;
mod session;

pub use error::SessionError;
pub use identity::{Caller, IdSource, SortableIds};
pub use manager::{ActiveGame, SessionManager};
pub use payload::{GamePayload, GameRules, TurnContext};
pub use probe::whose_turn;
pub use session::{Session, SessionConfig, SessionStatus};
