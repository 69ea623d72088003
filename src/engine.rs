//! The rules-engine seam and its in-process implementation.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use wallgo_rules::{Cell, Game, Grid, PlayerId, Wall};

use crate::{EngineError, Snapshot};

/// Operations the session controller needs from an authoritative rules engine.
///
/// Every call completes with a full answer; there are no partial results.
/// State-changing calls answer with the engine's resulting [`Snapshot`],
/// which is the only source of truth the controller trusts.
#[async_trait]
pub trait RulesEngine: Send + Sync {
    /// Current authoritative state.
    async fn get_state(&self) -> Result<Snapshot, EngineError>;

    /// Clears to a fresh default session.
    async fn reset(&self) -> Result<Snapshot, EngineError>;

    /// Moves the selected piece; `path[0]` is the piece, `path` has 1 or 2 cells.
    async fn move_piece(&self, path: &[Cell]) -> Result<Snapshot, EngineError>;

    /// Places the wall owed after a move.
    async fn place_wall(&self, wall: Wall) -> Result<Snapshot, EngineError>;

    /// Whether the piece on `cell` has at least one legal move.
    async fn has_legal_move(&self, cell: Cell) -> Result<bool, EngineError>;

    /// Cells the piece on `cell` may end its move on.
    async fn legal_destinations(&self, cell: Cell) -> Result<BTreeSet<Cell>, EngineError>;

    /// Installs the board built during setup.
    async fn commit_board_and_start_main(
        &self,
        board: Grid,
        starting_player: PlayerId,
        num_players: usize,
        pieces_per_player: usize,
        board_size: usize,
    ) -> Result<(), EngineError>;

    /// Finalizes the switch to the main phase.
    async fn start_main_phase(&self) -> Result<(), EngineError>;

    /// Territory per player.
    async fn region_scores(&self) -> Result<Vec<usize>, EngineError>;

    /// Forces the turn to the next player.
    async fn advance_turn(&self) -> Result<Snapshot, EngineError>;
}

/// In-process engine backed by [`wallgo_rules::Game`].
///
/// Rejected moves and walls are logged and answered with the unchanged state,
/// so the caller always sees what the engine actually holds.
#[derive(Debug)]
pub struct LocalEngine {
    game: Option<Mutex<Game>>,
}

impl LocalEngine {
    /// Creates an engine holding a fresh game.
    #[instrument]
    pub fn new() -> Self {
        Self {
            game: Some(Mutex::new(Game::new())),
        }
    }

    /// Creates an engine that failed to start; every call reports it unavailable.
    #[instrument]
    pub fn unavailable() -> Self {
        Self { game: None }
    }

    fn game(&self) -> Result<MutexGuard<'_, Game>, EngineError> {
        let game = self
            .game
            .as_ref()
            .ok_or_else(|| EngineError::Unavailable("engine not initialized".to_string()))?;
        game.lock()
            .map_err(|_| EngineError::Unavailable("engine state poisoned".to_string()))
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RulesEngine for LocalEngine {
    #[instrument(skip(self))]
    async fn get_state(&self) -> Result<Snapshot, EngineError> {
        Ok(Snapshot::from(self.game()?.state()))
    }

    #[instrument(skip(self))]
    async fn reset(&self) -> Result<Snapshot, EngineError> {
        let mut game = self.game()?;
        game.reset();
        Ok(Snapshot::from(game.state()))
    }

    #[instrument(skip(self))]
    async fn move_piece(&self, path: &[Cell]) -> Result<Snapshot, EngineError> {
        let mut game = self.game()?;
        if let Err(e) = game.move_piece(path) {
            warn!(error = %e, "Move rejected by rules");
        }
        Ok(Snapshot::from(game.state()))
    }

    #[instrument(skip(self))]
    async fn place_wall(&self, wall: Wall) -> Result<Snapshot, EngineError> {
        let mut game = self.game()?;
        if let Err(e) = game.place_wall(wall) {
            warn!(error = %e, "Wall rejected by rules");
        }
        Ok(Snapshot::from(game.state()))
    }

    #[instrument(skip(self))]
    async fn has_legal_move(&self, cell: Cell) -> Result<bool, EngineError> {
        Ok(self.game()?.has_legal_move(cell))
    }

    #[instrument(skip(self))]
    async fn legal_destinations(&self, cell: Cell) -> Result<BTreeSet<Cell>, EngineError> {
        Ok(self.game()?.legal_destinations(cell))
    }

    #[instrument(skip(self, board))]
    async fn commit_board_and_start_main(
        &self,
        board: Grid,
        starting_player: PlayerId,
        num_players: usize,
        pieces_per_player: usize,
        board_size: usize,
    ) -> Result<(), EngineError> {
        self.game()?
            .commit_board(
                board,
                starting_player,
                num_players,
                pieces_per_player,
                board_size,
            )
            .map_err(|e| EngineError::Rejected(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn start_main_phase(&self) -> Result<(), EngineError> {
        self.game()?.start_main_phase();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn region_scores(&self) -> Result<Vec<usize>, EngineError> {
        let scores = self.game()?.region_scores();
        debug!(?scores, "Region scores computed");
        Ok(scores)
    }

    #[instrument(skip(self))]
    async fn advance_turn(&self) -> Result<Snapshot, EngineError> {
        let mut game = self.game()?;
        game.advance_turn();
        Ok(Snapshot::from(game.state()))
    }
}
