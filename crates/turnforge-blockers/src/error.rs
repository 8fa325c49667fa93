//! Error types for Blockers.

use std::fmt;

/// Why a piece index was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceRejection {
    /// Not an index into the catalog.
    OutOfRange,
    /// The quadrant already placed this piece.
    AlreadyUsed,
}

impl fmt::Display for PieceRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "must be less than {}", crate::PIECES_COUNT),
            Self::AlreadyUsed => write!(f, "that piece has already been used"),
        }
    }
}

/// An illegal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("invalid piece {piece}: {reason}")]
    InvalidPiece { piece: u8, reason: PieceRejection },

    #[error("piece/position/rotation combination at {position} is not contained on the board")]
    OutOfBounds { position: u16 },

    #[error("cell {0} already occupied")]
    CellOccupied(usize),

    /// A cell of the piece shares an edge with a piece of the same colour.
    #[error("face to face constraint not met, cell {0}")]
    FaceToFace(usize),

    #[error("first corner constraint not met")]
    FirstCornerRequired,

    #[error("corner touch constraint not met")]
    CornerTouchRequired,
}

/// A board or flag string that doesn't decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid digit {found:?}, only {allowed} are accepted")]
    InvalidDigit { found: char, allowed: &'static str },

    #[error("expected {expected} entries, found {found}")]
    Length { expected: usize, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_piece_messages() {
        let out = PlacementError::InvalidPiece {
            piece: 30,
            reason: PieceRejection::OutOfRange,
        };
        assert_eq!(out.to_string(), "invalid piece 30: must be less than 21");

        let used = PlacementError::InvalidPiece {
            piece: 3,
            reason: PieceRejection::AlreadyUsed,
        };
        assert_eq!(used.to_string(), "invalid piece 3: that piece has already been used");
    }
}
