//! The placement validator.

use crate::board::{BOARD_DIMS, Board, Cell, Quadrant};
use crate::catalog::Piece;
use crate::PlacementError;

const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Checks whether `quadrant` may put `piece` (already flipped and
/// rotated) with its bounding box's top-left at board index `position`.
///
/// Returns the board indexes the piece would cover, in row-major order.
/// The board is not modified.
///
/// The checks run in this order, the first failure wins:
///
/// 1. the bounding box fits on the board
/// 2. per covered cell: the cell is empty, and no edge neighbour is
///    the same colour
/// 3. the quadrant's starting corner is covered now or was already
///    taken by it
/// 4. some covered cell touches the same colour corner to corner,
///    unless this is the quadrant's first placement
pub fn validate_placement(
    board: &Board,
    quadrant: Quadrant,
    piece: &Piece,
    position: u16,
) -> Result<Vec<usize>, PlacementError> {
    let dims = usize::from(BOARD_DIMS);
    let (pos_x, pos_y) = Board::coords(usize::from(position));
    if pos_x + usize::from(piece.width()) > dims || pos_y + usize::from(piece.height()) > dims {
        return Err(PlacementError::OutOfBounds { position });
    }

    let own = Cell::Taken(quadrant);
    let start = quadrant.start_corner();
    let mut first_corner_met = board.get(start) == Some(own);
    // Only a quadrant that already has its corner needs a corner touch.
    let mut corner_met = !first_corner_met;

    let mut covered = Vec::with_capacity(piece.size());
    for (dx, dy) in piece.cells() {
        let x = pos_x + usize::from(dx);
        let y = pos_y + usize::from(dy);
        let idx = y * dims + x;

        if board.get(idx) != Some(Cell::Empty) {
            return Err(PlacementError::CellOccupied(idx));
        }
        first_corner_met |= idx == start;

        for (ox, oy) in NEIGHBOURS {
            let (Some(nx), Some(ny)) = (x.checked_add_signed(ox), y.checked_add_signed(oy)) else {
                continue;
            };
            if nx >= dims || ny >= dims {
                continue;
            }
            let n = ny * dims + nx;
            if board.get(n) != Some(own) {
                continue;
            }
            if ox == 0 || oy == 0 {
                return Err(PlacementError::FaceToFace(n));
            }
            corner_met = true;
        }

        covered.push(idx);
    }

    if !first_corner_met {
        return Err(PlacementError::FirstCornerRequired);
    }
    if !corner_met {
        return Err(PlacementError::CornerTouchRequired);
    }
    Ok(covered)
}
