use turnforge::game::{BOARD_DIMS, Board, Cell};
use turnforge::prelude::*;

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// Opening moves for a two-player game: each quadrant claims its corner
/// with the 2×2 square, then extends diagonally with the domino.
fn script() -> Vec<TurnArgs> {
    let mut moves = Vec::new();
    for q in Quadrant::ALL {
        let corner = q.start_corner();
        let (x, y) = Board::coords(corner);
        // top-left of the 2×2 box that covers the corner
        let bx = x.saturating_sub(1);
        let by = y.saturating_sub(1);
        moves.push(TurnArgs::place(5, Board::index(bx as u8, by as u8) as u16));
    }
    for (x, y) in [(2, 2), (16, 2), (16, 17), (2, 17)] {
        moves.push(TurnArgs::place(1, Board::index(x, y) as u16));
    }
    moves
}

fn render(board: &Board) -> String {
    let dims = usize::from(BOARD_DIMS);
    let mut out = String::with_capacity(board.cells().len() + dims);
    for row in board.cells().chunks(dims) {
        out.push('\n');
        for cell in row {
            out.push(match cell {
                Cell::Empty => '.',
                Cell::Taken(q) => char::from(b'A' + q.index() as u8),
            });
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), TurnforgeError> {
    turnforge::init_tracing();

    let tf = TurnforgeBuilder::new()
        .build(MemoryStore::new(), MemoryCache::new())
        .await;
    let blockers = tf.blockers();

    let mut alice = Caller::anonymous();
    let mut bob = Caller::anonymous();
    let game = blockers.new_game(&mut alice).await?.id;
    blockers.join(&mut bob, game).await?;
    blockers.start(&alice, true).await?;
    let players = [alice, bob];

    // Whoever moves first after the shuffle.
    let mut session = blockers
        .get(game, None)
        .await?
        .ok_or(SessionError::NotFound(game))?;

    let rejected = TurnArgs::place(0, Board::index(9, 9) as u16);
    let Some(mover) = blockers.whose_turn(game, &players).await? else {
        tracing::warn!(%game, "nobody to move");
        return Ok(());
    };
    match blockers.take_turn(&players[mover], rejected).await {
        Err(TurnforgeError::Placement(err)) => tracing::info!(%err, "illegal opening rejected"),
        other => tracing::warn!(?other, "expected a placement error"),
    }

    for args in script() {
        let Some(mover) = blockers.whose_turn(game, &players).await? else {
            break;
        };
        session = blockers.take_turn(&players[mover], args).await?;
        tracing::info!(turn = session.turn, mover, piece = args.piece, "placed");
    }
    tracing::info!(board = %render(session.payload.board()), "after opening");

    while session.status == SessionStatus::Started {
        let Some(mover) = blockers.whose_turn(game, &players).await? else {
            break;
        };
        session = blockers.take_turn(&players[mover], TurnArgs::pass()).await?;
        tracing::info!(turn = session.turn, mover, "passed");
    }
    tracing::info!(status = %session.status, turn = session.turn, "game over");

    if let Some(stats) = tf.shutdown().await? {
        tracing::info!(runs = stats.runs, deleted = stats.deleted, "sweeper stopped");
    }
    Ok(())
}
