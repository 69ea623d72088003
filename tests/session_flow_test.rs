//! End-to-end sessions against the in-process rules engine.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use wallgo::players::{FirstLegalPlayer, Player};
use wallgo::{
    Cell, Dispatch, GameEvent, Interaction, LocalEngine, Orchestrator, Orientation, Outcome,
    Phase, RulesEngine, SessionConfig, SessionController, Wall,
};

fn config(board_size: usize, players: usize, pieces: usize) -> SessionConfig {
    SessionConfig::new().with_overrides(Some(board_size), Some(players), Some(pieces))
}

async fn session(board_size: usize, players: usize, pieces: usize) -> SessionController<LocalEngine> {
    let mut session =
        SessionController::new(Arc::new(LocalEngine::new()), config(board_size, players, pieces));
    session.connect().await.unwrap();
    assert_eq!(session.submit_options(), Ok(Dispatch::Applied));
    session
}

/// Plays one full turn: select, move (or stay), wall.
async fn turn(session: &mut SessionController<LocalEngine>, from: Cell, to: Cell, wall: Wall) {
    assert_eq!(session.select_piece(from).await, Ok(Dispatch::Applied), "select {from}");
    assert_eq!(session.submit_destination(to).await, Ok(Dispatch::Applied), "move {to}");
    assert_eq!(session.place_wall(wall).await, Ok(Dispatch::Applied), "wall {wall}");
}

#[tokio::test]
async fn test_setup_draft_commits_board_and_starts_main() {
    let mut session = session(7, 2, 2).await;

    let cells = [Cell::new(0, 0), Cell::new(6, 6), Cell::new(5, 6), Cell::new(0, 1)];
    let mut drafted = Vec::new();
    for cell in cells {
        drafted.push(session.state().acting_player().unwrap());
        assert_eq!(session.place_token(cell).await, Ok(Dispatch::Applied));
    }
    assert_eq!(drafted, vec![0, 1, 1, 0]);

    let snap = session.state().snapshot().clone().unwrap();
    assert_eq!(snap.phase, Phase::Main);
    assert_eq!(snap.current_player, 1);
    assert_eq!(snap.board[0][0], Some(0));
    assert_eq!(snap.board[6][6], Some(1));
    assert_eq!(snap.board[5][6], Some(1));
    assert_eq!(snap.board[0][1], Some(0));

    assert!(session.state().selectable_is_current());
    assert_eq!(session.state().selectable().len(), 2);
    assert_eq!(
        session.state().interaction(),
        Some(&Interaction::NoSelection)
    );
}

#[tokio::test]
async fn test_occupied_cell_ignored_during_draft() {
    let mut session = session(7, 2, 1).await;
    session.place_token(Cell::new(3, 3)).await.unwrap();
    assert_eq!(
        session.place_token(Cell::new(3, 3)).await,
        Ok(Dispatch::Ignored)
    );
    assert_eq!(session.state().acting_player(), Some(1));
    assert_eq!(
        session.engine().get_state().await.unwrap().phase,
        Phase::Setup
    );
}

#[tokio::test]
async fn test_walled_in_player_is_skipped() {
    let mut session = session(7, 3, 1).await;
    let (p0, p1, p2) = (Cell::new(3, 3), Cell::new(0, 1), Cell::new(3, 4));
    for cell in [p0, p1, p2] {
        session.place_token(cell).await.unwrap();
    }
    assert_eq!(session.state().acting_player(), Some(0));

    let corner = Cell::new(0, 0);
    let h = |r, c| Wall::new(Orientation::H, Cell::new(r, c));
    let v = |r, c| Wall::new(Orientation::V, Cell::new(r, c));

    // Round one: player 1 steps into the corner and seals its south edge.
    turn(&mut session, p0, p0, h(2, 3)).await;
    turn(&mut session, p1, corner, h(0, 0)).await;
    turn(&mut session, p2, p2, h(2, 4)).await;

    // Round two: player 1 stays and seals the last open edge.
    turn(&mut session, p0, p0, v(3, 2)).await;
    assert_eq!(session.state().selectable().len(), 1);
    turn(&mut session, corner, corner, v(0, 0)).await;
    turn(&mut session, p2, p2, h(3, 4)).await;

    // Round three: after player 0, player 1 cannot move and is passed over.
    turn(&mut session, p0, p0, h(3, 3)).await;
    assert_eq!(session.state().acting_player(), Some(2));
    assert_eq!(session.engine().get_state().await.unwrap().current_player, 2);
    assert_eq!(session.state().selectable(), &BTreeSet::from([p2]));
    assert_eq!(session.state().winner(), None);
}

#[tokio::test]
async fn test_bots_play_to_the_end() {
    let controller =
        SessionController::new(Arc::new(LocalEngine::new()), config(5, 2, 1));
    let players: Vec<Box<dyn Player>> = vec![
        Box::new(FirstLegalPlayer::new("Bot 0")),
        Box::new(FirstLegalPlayer::new("Bot 1")),
    ];
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut orchestrator = Orchestrator::new(controller, players, event_tx).with_ignored_limit(1);

    let outcome = orchestrator.run().await.unwrap();
    let Outcome::Finished { winner, scores } = outcome else {
        panic!("expected a finished game");
    };
    assert_eq!(scores.len(), 2);
    assert!(scores.iter().sum::<usize>() <= 25);
    assert_eq!(scores[winner], *scores.iter().max().unwrap());

    drop(orchestrator);
    let mut saw_game_over = false;
    while let Some(event) = event_rx.recv().await {
        assert!(!matches!(event, GameEvent::ActionIgnored { .. }));
        if matches!(event, GameEvent::GameOver { .. }) {
            saw_game_over = true;
        }
    }
    assert!(saw_game_over);
}

#[tokio::test]
async fn test_bots_join_a_game_already_in_main() {
    let engine = Arc::new(LocalEngine::new());
    let mut board = vec![vec![None; 7]; 7];
    board[2][3] = Some(0);
    board[4][4] = Some(1);
    engine
        .commit_board_and_start_main(board, 0, 2, 1, 7)
        .await
        .unwrap();
    engine.start_main_phase().await.unwrap();

    let mut session = SessionController::new(Arc::clone(&engine), config(7, 2, 1));
    session.connect().await.unwrap();
    assert!(session.state().selectable_is_current());
    assert_eq!(
        session.select_piece(Cell::new(2, 3)).await,
        Ok(Dispatch::Applied)
    );

    let controller = SessionController::new(engine, config(7, 2, 1));
    let players: Vec<Box<dyn Player>> = vec![
        Box::new(FirstLegalPlayer::new("Bot 0")),
        Box::new(FirstLegalPlayer::new("Bot 1")),
    ];
    let (event_tx, _event_rx) = mpsc::unbounded_channel();
    let mut orchestrator = Orchestrator::new(controller, players, event_tx).with_ignored_limit(1);
    let Outcome::Finished { scores, .. } = orchestrator.run().await.unwrap() else {
        panic!("expected a finished game");
    };
    assert_eq!(scores.len(), 2);
}

#[tokio::test]
async fn test_seat_count_checked() {
    let controller =
        SessionController::new(Arc::new(LocalEngine::new()), config(5, 3, 1));
    let players: Vec<Box<dyn Player>> = vec![Box::new(FirstLegalPlayer::new("Lonely"))];
    let (event_tx, _event_rx) = mpsc::unbounded_channel();
    let mut orchestrator = Orchestrator::new(controller, players, event_tx);
    assert!(orchestrator.run().await.is_err());
}
