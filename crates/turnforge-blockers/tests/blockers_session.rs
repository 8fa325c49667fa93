//! Blockers played through the session manager.

use std::sync::Arc;

use turnforge_blockers::{
    BlockersGame, Board, Cell, PlacementError, Quadrant, TurnArgs, take_turn,
};
use turnforge_session::{
    Caller, Session, SessionConfig, SessionError, SessionManager, SessionStatus,
};
use turnforge_store::{MemoryCache, MemoryStore};

type Manager = SessionManager<MemoryStore, MemoryCache>;

fn manager() -> Arc<Manager> {
    Arc::new(SessionManager::new(
        MemoryStore::new(),
        MemoryCache::new(),
        SessionConfig::default(),
    ))
}

/// Creates a game with `n` players and starts it in join order.
async fn started(m: &Manager, n: usize) -> Vec<Caller> {
    let mut callers = vec![Caller::anonymous(); n];
    let game = m.create::<BlockersGame>(&mut callers[0]).await.unwrap().id;
    for caller in callers.iter_mut().skip(1) {
        m.join::<BlockersGame>(caller, game).await.unwrap();
    }
    m.start::<BlockersGame>(&callers[0], false).await.unwrap();
    callers
}

async fn play(
    m: &Manager,
    caller: &Caller,
    args: TurnArgs,
) -> Result<Session<BlockersGame>, SessionError> {
    m.take_turn::<BlockersGame, _, _>(caller, move |ctx| take_turn(ctx, &args)).await
}

fn corner(q: usize) -> u16 {
    Quadrant::ALL[q].start_corner() as u16
}

#[tokio::test]
async fn test_first_move_must_cover_corner() {
    let m = manager();
    let players = started(&m, 2).await;

    let err = play(&m, &players[0], TurnArgs::place(0, Board::index(3, 3) as u16))
        .await
        .unwrap_err();
    assert_eq!(err.rule::<PlacementError>(), Some(&PlacementError::FirstCornerRequired));

    let session = play(&m, &players[0], TurnArgs::place(0, corner(0))).await.unwrap();
    assert_eq!(session.payload.board().get(0), Some(Cell::Taken(Quadrant::ALL[0])));
    assert_eq!(session.turn, 1);
}

#[tokio::test]
async fn test_two_players_alternate_quadrants() {
    let m = manager();
    let players = started(&m, 2).await;

    // turn 0: player 0 plays q0, turn 1: player 1 plays q1,
    // turn 2: player 0 plays q2, turn 3: player 1 plays q3
    for turn in 0..4 {
        let session = play(&m, &players[turn % 2], TurnArgs::place(0, corner(turn)))
            .await
            .unwrap();
        let q = Quadrant::ALL[turn];
        assert_eq!(session.payload.board().get(q.start_corner()), Some(Cell::Taken(q)));
    }
}

#[tokio::test]
async fn test_three_players_never_play_fourth_quadrant() {
    let m = manager();
    let players = started(&m, 3).await;

    for turn in 0..3 {
        play(&m, &players[turn], TurnArgs::place(0, corner(turn)))
            .await
            .unwrap();
    }

    let game = m
        .active(&players[0])
        .await
        .unwrap()
        .unwrap()
        .id;
    let session = m.get::<BlockersGame>(game, None).await.unwrap().unwrap();
    // q2's turn skipped q3: turn 4 is q0 again, played by players[1]
    assert_eq!(session.turn, 4);
    assert!(session.is_turn_of(players[1].participant().unwrap()));
    assert_eq!(session.payload.board().count(Quadrant::ALL[3]), 0);
}

#[tokio::test]
async fn test_passing_ends_and_finishes() {
    let m = manager();
    let players = started(&m, 2).await;

    let mut last = None;
    for turn in 0..4 {
        last = Some(play(&m, &players[turn % 2], TurnArgs::pass()).await.unwrap());
    }

    let session = last.unwrap();
    assert_eq!(session.status, SessionStatus::Finished);
    assert!(m.active(&players[0]).await.unwrap().is_none());
}

#[tokio::test]
async fn test_pass_skips_ended_quadrant() {
    let m = manager();
    let players = started(&m, 2).await;

    play(&m, &players[0], TurnArgs::place(0, corner(0))).await.unwrap();
    // q1 passes for the rest of the game
    play(&m, &players[1], TurnArgs::pass()).await.unwrap();
    play(&m, &players[0], TurnArgs::place(0, corner(2))).await.unwrap();
    let session = play(&m, &players[1], TurnArgs::place(0, corner(3))).await.unwrap();

    // after q3 comes q0, then q1 is skipped on the following turn
    assert_eq!(session.turn, 4);
    let session = play(&m, &players[0], TurnArgs::place(1, Board::index(1, 1) as u16))
        .await
        .unwrap();
    assert_eq!(session.turn, 6);
    assert!(session.is_turn_of(players[0].participant().unwrap()));
}

#[tokio::test]
async fn test_rejected_placement_keeps_turn() {
    let m = manager();
    let players = started(&m, 2).await;
    play(&m, &players[0], TurnArgs::place(0, corner(0))).await.unwrap();
    play(&m, &players[1], TurnArgs::place(0, corner(1))).await.unwrap();
    play(&m, &players[0], TurnArgs::place(0, corner(2))).await.unwrap();
    play(&m, &players[1], TurnArgs::place(0, corner(3))).await.unwrap();

    // q0 again: touching its own piece edge to edge
    let err = play(&m, &players[0], TurnArgs::place(1, 1)).await.unwrap_err();
    assert_eq!(err.rule::<PlacementError>(), Some(&PlacementError::FaceToFace(0)));

    let session = play(&m, &players[0], TurnArgs::place(1, Board::index(1, 1) as u16))
        .await
        .unwrap();
    assert_eq!(session.turn, 5);
}

#[tokio::test]
async fn test_concurrent_turns_land_once() {
    let m = manager();
    let players = started(&m, 2).await;
    let mover = players[0];

    let mut handles = Vec::new();
    for _ in 0..6 {
        let m = Arc::clone(&m);
        handles.push(tokio::spawn(async move {
            play(&m, &mover, TurnArgs::place(0, corner(0))).await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(session) => {
                ok += 1;
                assert_eq!(session.payload.board().count(Quadrant::ALL[0]), 1);
            }
            Err(err) => assert!(err.is_precondition() || err.rule::<PlacementError>().is_some()),
        }
    }
    assert_eq!(ok, 1);
}
