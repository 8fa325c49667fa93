//! The Blockers payload and its per-turn bookkeeping.

use serde::{Deserialize, Serialize};
use turnforge_session::{GamePayload, GameRules, TurnContext};

use crate::board::{Board, Cell, Flags, QUADRANTS, Quadrant};
use crate::catalog::{PIECES_COUNT, piece};
use crate::error::{DecodeError, PieceRejection, PlacementError};
use crate::placement::validate_placement;

/// The Blockers game document.
///
/// `pieceSets` holds one availability flag per (quadrant, piece), at
/// index `quadrant * 21 + piece`. `pieceSetsEnded` holds one flag per
/// quadrant and only ever goes from `0` to `1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawGame")]
pub struct BlockersGame {
    board: Board,
    piece_sets: Flags,
    piece_sets_ended: Flags,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGame {
    board: Board,
    piece_sets: Flags,
    piece_sets_ended: Flags,
}

impl TryFrom<RawGame> for BlockersGame {
    type Error = DecodeError;

    fn try_from(raw: RawGame) -> Result<Self, Self::Error> {
        for (flags, expected) in [
            (&raw.piece_sets, QUADRANTS * PIECES_COUNT),
            (&raw.piece_sets_ended, QUADRANTS),
        ] {
            if flags.len() != expected {
                return Err(DecodeError::Length {
                    expected,
                    found: flags.len(),
                });
            }
        }
        Ok(Self {
            board: raw.board,
            piece_sets: raw.piece_sets,
            piece_sets_ended: raw.piece_sets_ended,
        })
    }
}

impl Default for BlockersGame {
    fn default() -> Self {
        Self {
            board: Board::new(),
            piece_sets: Flags::filled(QUADRANTS * PIECES_COUNT, true),
            piece_sets_ended: Flags::filled(QUADRANTS, false),
        }
    }
}

impl GamePayload for BlockersGame {
    const GAME_TYPE: &'static str = "blockers";

    fn new_game() -> Self {
        Self::default()
    }

    fn rules() -> GameRules {
        GameRules {
            min_players: 2,
            max_players: QUADRANTS,
        }
    }
}

/// What a turn did to the envelope, on top of the usual `turn + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnOutcome {
    /// Extra turns skipped over ended or excluded quadrants.
    pub skipped: u32,
    /// Every quadrant still in play has ended.
    pub finished: bool,
}

impl BlockersGame {
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns `true` if `quadrant` still holds catalog piece `piece`.
    pub fn is_available(&self, quadrant: Quadrant, piece: u8) -> bool {
        usize::from(piece) < PIECES_COUNT
            && self.piece_sets.get(quadrant.index() * PIECES_COUNT + usize::from(piece))
    }

    /// Pieces `quadrant` hasn't placed yet.
    pub fn remaining(&self, quadrant: Quadrant) -> usize {
        (0..PIECES_COUNT as u8)
            .filter(|&p| self.is_available(quadrant, p))
            .count()
    }

    pub fn is_ended(&self, quadrant: Quadrant) -> bool {
        self.piece_sets_ended.get(quadrant.index())
    }

    /// Applies one move for the quadrant of `turn`.
    ///
    /// On error the game is unchanged.
    pub fn apply(
        &mut self,
        turn: u32,
        player_count: usize,
        args: &TurnArgs,
    ) -> Result<TurnOutcome, PlacementError> {
        let quadrant = Quadrant::for_turn(turn);

        if args.pass {
            if !quadrant.is_excluded(player_count) {
                self.piece_sets_ended.set(quadrant.index(), true);
            }
        } else {
            self.place(quadrant, args)?;
        }

        let mut still_active = 0;
        for q in Quadrant::ALL {
            if q.is_excluded(player_count) || self.is_ended(q) {
                continue;
            }
            if self.remaining(q) == 0 {
                self.piece_sets_ended.set(q.index(), true);
                tracing::debug!(%q, "quadrant out of pieces");
            } else {
                still_active += 1;
            }
        }
        if still_active == 0 {
            return Ok(TurnOutcome {
                skipped: 0,
                finished: true,
            });
        }

        let mut skipped = 0;
        let mut next = quadrant.next();
        for _ in 0..QUADRANTS {
            if !next.is_excluded(player_count) && !self.is_ended(next) {
                break;
            }
            skipped += 1;
            next = next.next();
        }
        Ok(TurnOutcome {
            skipped,
            finished: false,
        })
    }

    fn place(&mut self, quadrant: Quadrant, args: &TurnArgs) -> Result<(), PlacementError> {
        let mut shape = piece(args.piece).ok_or(PlacementError::InvalidPiece {
            piece: args.piece,
            reason: PieceRejection::OutOfRange,
        })?;
        if !self.is_available(quadrant, args.piece) {
            return Err(PlacementError::InvalidPiece {
                piece: args.piece,
                reason: PieceRejection::AlreadyUsed,
            });
        }

        shape.transform(args.rotation, args.flip);
        let covered = validate_placement(&self.board, quadrant, &shape, args.position)?;

        for idx in covered {
            self.board.set(idx, Cell::Taken(quadrant));
        }
        self.piece_sets
            .set(quadrant.index() * PIECES_COUNT + usize::from(args.piece), false);
        Ok(())
    }
}

/// One Blockers move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnArgs {
    /// Give up: this quadrant places no more pieces for the rest of the
    /// game. The remaining fields are ignored.
    #[serde(default)]
    pub pass: bool,
    /// Catalog index of the piece to place.
    #[serde(default)]
    pub piece: u8,
    /// Board index of the transformed bounding box's top-left cell.
    #[serde(default)]
    pub position: u16,
    /// Number of clockwise quarter turns, taken mod 4.
    #[serde(default)]
    pub rotation: u8,
    /// Mirror the piece before rotating it.
    #[serde(default)]
    pub flip: bool,
}

impl TurnArgs {
    pub fn pass() -> Self {
        Self {
            pass: true,
            ..Self::default()
        }
    }

    pub fn place(piece: u8, position: u16) -> Self {
        Self {
            piece,
            position,
            ..Self::default()
        }
    }

    pub fn rotated(mut self, rotation: u8) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn flipped(mut self) -> Self {
        self.flip = true;
        self
    }
}

/// Runs one move inside a session turn: applies `args`, then records
/// skipped quadrants and game end on the context.
pub fn take_turn(
    ctx: &mut TurnContext<'_, BlockersGame>,
    args: &TurnArgs,
) -> Result<(), PlacementError> {
    let turn = ctx.turn();
    let players = ctx.player_count();
    let outcome = ctx.payload_mut().apply(turn, players, args)?;
    for _ in 0..outcome.skipped {
        ctx.skip_turn();
    }
    if outcome.finished {
        ctx.finish();
    }
    Ok(())
}
