//! Blockers: a four-colour polyomino placement game on a 20×20 board.
//!
//! The board is split between four quadrants (colours), each owning a
//! set of 21 pieces and one starting corner:
//!
//! ```text
//!  q0 ──────────── q1
//!  │                │
//!  │    20 × 20     │
//!  │                │
//!  q3 ──────────── q2
//! ```
//!
//! On turn `t` the mover plays quadrant `t mod 4`. A piece must cover
//! its quadrant's starting corner on the quadrant's first placement and
//! touch a same-coloured piece corner to corner on every later one;
//! same-coloured pieces may never share an edge.
//!
//! This crate provides:
//!
//! - the read-only piece catalog and its transforms ([`piece`], [`Piece`])
//! - the board and its compact text form ([`Board`], [`Cell`], [`Flags`])
//! - the placement validator ([`validate_placement`])
//! - the game payload and turn bookkeeping ([`BlockersGame`],
//!   [`TurnArgs`], [`take_turn`])

mod board;
mod catalog;
mod error;
mod game;
mod placement;

pub use board::{BOARD_CELLS, BOARD_DIMS, Board, Cell, Flags, QUADRANTS, Quadrant};
pub use catalog::{PIECES_COUNT, Piece, piece};
pub use error::{DecodeError, PieceRejection, PlacementError};
pub use game::{BlockersGame, TurnArgs, TurnOutcome, take_turn};
pub use placement::validate_placement;
