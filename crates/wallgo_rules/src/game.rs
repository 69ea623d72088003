//! The owned rules engine.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument, warn};

use super::rules;
use super::{
    Cell, GameState, Grid, MAX_BOARD_SIZE, MAX_PLAYERS, MIN_BOARD_SIZE, MIN_PLAYERS,
    Orientation, Phase, PlacedWall, PlayerId, RuleError, Wall,
};

/// A wall-go game.
///
/// Every mutating operation either succeeds completely or returns a
/// [`RuleError`] with the state untouched.
#[derive(Debug, Clone, Default)]
pub struct Game {
    state: GameState,
}

impl Game {
    /// Creates a game in its default setup state.
    #[instrument]
    pub fn new() -> Self {
        Self {
            state: GameState::new(),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Discards everything and returns to the default setup state.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        info!("Resetting game");
        self.state = GameState::new();
    }

    /// Installs the board built during setup.
    ///
    /// Changing the board size wipes walls, the pending move and any winner.
    #[instrument(skip(self, board))]
    pub fn commit_board(
        &mut self,
        board: Grid,
        starting_player: PlayerId,
        num_players: usize,
        pieces_per_player: usize,
        board_size: usize,
    ) -> Result<(), RuleError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&board_size) {
            return Err(RuleError::InvalidParameters(format!(
                "board size {board_size}"
            )));
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) || starting_player >= num_players
        {
            return Err(RuleError::InvalidParameters(format!(
                "player {starting_player} of {num_players}"
            )));
        }
        if pieces_per_player == 0 {
            return Err(RuleError::InvalidParameters("zero pieces".to_string()));
        }
        if board.len() != board_size || board.iter().any(|row| row.len() != board_size) {
            return Err(RuleError::InvalidParameters(
                "board does not match its size".to_string(),
            ));
        }
        if board.iter().flatten().flatten().any(|&p| p >= num_players) {
            return Err(RuleError::InvalidParameters(
                "piece owned by unknown player".to_string(),
            ));
        }

        let state = &mut self.state;
        if state.board_size != board_size {
            debug!(old = state.board_size, new = board_size, "Board size changed");
            state.walls_h.clear();
            state.walls_v.clear();
            state.move_path.clear();
            state.winner = None;
            state.phase = Phase::Setup;
            state.wall_pending = false;
        }
        state.board_size = board_size;
        state.board = board;
        state.current_player = starting_player;
        state.num_players = num_players;
        state.pieces_per_player = pieces_per_player;
        info!(starting_player, num_players, board_size, "Board committed");
        Ok(())
    }

    /// Switches to the main phase.
    #[instrument(skip(self))]
    pub fn start_main_phase(&mut self) {
        info!("Entering main phase");
        self.state.phase = Phase::Main;
    }

    fn require_turn(&self) -> Result<(), RuleError> {
        if self.state.phase != Phase::Main {
            return Err(RuleError::WrongPhase(Phase::Main));
        }
        if self.state.winner.is_some() {
            return Err(RuleError::GameOver);
        }
        Ok(())
    }

    /// Whether the piece on `cell` has any legal move.
    #[instrument(skip(self))]
    pub fn has_legal_move(&self, cell: Cell) -> bool {
        !rules::legal_destinations(&self.state, cell).is_empty()
    }

    /// All cells the piece on `cell` may end its move on.
    #[instrument(skip(self))]
    pub fn legal_destinations(&self, cell: Cell) -> BTreeSet<Cell> {
        rules::legal_destinations(&self.state, cell)
    }

    /// Moves a piece along `path` (`[src]` stays, `[src, dst]` moves).
    ///
    /// Afterwards the mover owes a wall, unless the destination has no open edge,
    /// in which case the turn passes straight on.
    #[instrument(skip(self))]
    pub fn move_piece(&mut self, path: &[Cell]) -> Result<(), RuleError> {
        self.require_turn()?;
        if self.state.wall_pending {
            return Err(RuleError::WallPending);
        }
        let (src, dst) = match *path {
            [src] => (src, src),
            [src, dst] => (src, dst),
            _ => return Err(RuleError::PathLength(path.len())),
        };
        let size = self.state.board_size;
        if let Some(&off) = path.iter().find(|cell| !cell.in_bounds(size)) {
            return Err(RuleError::OutOfBounds(off));
        }
        let player = self.state.current_player;
        if self.state.occupant(src) != Some(player) {
            return Err(RuleError::NotOwned(src, player));
        }
        if !rules::is_legal_path(&self.state, path) {
            return Err(RuleError::Unreachable(src, dst));
        }

        if src != dst {
            self.state.board[src.row][src.col] = None;
            self.state.board[dst.row][dst.col] = Some(player);
        }
        self.state.move_path = path.to_vec();
        debug!(player, %src, %dst, "Piece moved");

        if rules::wall_candidates(&self.state, dst).is_empty() {
            warn!(player, %dst, "No open edge to wall, ending turn");
            self.finish_turn();
        } else {
            self.state.wall_pending = true;
        }
        Ok(())
    }

    /// Places the wall owed by the current player and ends the turn.
    #[instrument(skip(self))]
    pub fn place_wall(&mut self, wall: Wall) -> Result<(), RuleError> {
        self.require_turn()?;
        if !self.state.wall_pending {
            return Err(RuleError::NoWallPending);
        }
        if !rules::is_legal_wall(&self.state, wall) {
            return Err(RuleError::IllegalWall(wall));
        }

        let player = self.state.current_player;
        let placed = PlacedWall::new(wall.cell, player);
        match wall.orientation {
            Orientation::H => self.state.walls_h.push(placed),
            Orientation::V => self.state.walls_v.push(placed),
        }
        debug!(player, %wall, "Wall placed");
        self.finish_turn();
        Ok(())
    }

    /// Passes the turn to the next player without a move.
    #[instrument(skip(self))]
    pub fn advance_turn(&mut self) {
        let state = &mut self.state;
        state.current_player = (state.current_player + 1) % state.num_players.max(1);
        debug!(current_player = state.current_player, "Turn advanced");
    }

    /// Territory per player.
    #[instrument(skip(self))]
    pub fn region_scores(&self) -> Vec<usize> {
        rules::region_scores(&self.state)
    }

    fn finish_turn(&mut self) {
        self.state.wall_pending = false;
        self.state.move_path.clear();
        self.advance_turn();

        if rules::all_isolated(&self.state) {
            let scores = rules::region_scores(&self.state);
            self.state.winner = rules::leader(&scores);
            info!(winner = ?self.state.winner, ?scores, "All players isolated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::empty_grid;

    fn started(pieces: &[(usize, usize, PlayerId)], players: usize) -> Game {
        let mut board = empty_grid(7);
        for &(r, c, p) in pieces {
            board[r][c] = Some(p);
        }
        let mut game = Game::new();
        game.commit_board(board, 0, players, 1, 7).unwrap();
        game.start_main_phase();
        game
    }

    #[test]
    fn test_move_then_wall_advances_turn() {
        let mut game = started(&[(3, 3, 0), (5, 5, 1)], 2);
        game.move_piece(&[Cell::new(3, 3), Cell::new(3, 4)]).unwrap();
        assert!(game.state().wall_pending());
        assert_eq!(game.state().move_path(), &[Cell::new(3, 3), Cell::new(3, 4)]);

        game.place_wall(Wall::new(Orientation::V, Cell::new(3, 4))).unwrap();
        assert!(!game.state().wall_pending());
        assert!(game.state().move_path().is_empty());
        assert_eq!(game.state().current_player(), 1);
    }

    #[test]
    fn test_rejected_move_leaves_state() {
        let mut game = started(&[(3, 3, 0), (5, 5, 1)], 2);
        let before = game.state().clone();
        let err = game.move_piece(&[Cell::new(5, 5)]).unwrap_err();
        assert_eq!(err, RuleError::NotOwned(Cell::new(5, 5), 0));
        assert_eq!(game.state(), &before);
    }

    #[test]
    fn test_move_rejected_while_wall_pending() {
        let mut game = started(&[(3, 3, 0), (5, 5, 1)], 2);
        game.move_piece(&[Cell::new(3, 3)]).unwrap();
        assert_eq!(
            game.move_piece(&[Cell::new(3, 3)]),
            Err(RuleError::WallPending)
        );
    }

    #[test]
    fn test_wall_rejected_away_from_piece() {
        let mut game = started(&[(3, 3, 0), (5, 5, 1)], 2);
        game.move_piece(&[Cell::new(3, 3)]).unwrap();
        let far = Wall::new(Orientation::H, Cell::new(0, 0));
        assert_eq!(game.place_wall(far), Err(RuleError::IllegalWall(far)));
    }

    #[test]
    fn test_moves_rejected_in_setup() {
        let mut game = Game::new();
        assert_eq!(
            game.move_piece(&[Cell::new(0, 0)]),
            Err(RuleError::WrongPhase(Phase::Main))
        );
    }

    #[test]
    fn test_commit_rejects_mismatched_board() {
        let mut game = Game::new();
        let err = game.commit_board(empty_grid(6), 0, 2, 1, 7).unwrap_err();
        assert!(matches!(err, RuleError::InvalidParameters(_)));
    }

    #[test]
    fn test_isolation_ends_game() {
        // Player 1 walls itself into the corner over two turns.
        let mut game = started(&[(3, 3, 0), (0, 0, 1)], 2);
        game.move_piece(&[Cell::new(3, 3)]).unwrap();
        game.place_wall(Wall::new(Orientation::H, Cell::new(3, 3))).unwrap();
        game.move_piece(&[Cell::new(0, 0)]).unwrap();
        game.place_wall(Wall::new(Orientation::H, Cell::new(0, 0))).unwrap();
        assert_eq!(game.state().winner(), None);

        game.move_piece(&[Cell::new(3, 3)]).unwrap();
        game.place_wall(Wall::new(Orientation::H, Cell::new(2, 3))).unwrap();
        game.move_piece(&[Cell::new(0, 0)]).unwrap();
        game.place_wall(Wall::new(Orientation::V, Cell::new(0, 0))).unwrap();

        assert_eq!(game.region_scores(), vec![48, 1]);
        assert_eq!(game.state().winner(), Some(0));
        assert_eq!(game.place_wall(Wall::new(Orientation::H, Cell::new(1, 1))), Err(RuleError::GameOver));
    }

    #[test]
    fn test_advance_turn_wraps() {
        let mut game = started(&[(3, 3, 0), (5, 5, 1), (1, 1, 2)], 3);
        game.advance_turn();
        game.advance_turn();
        game.advance_turn();
        assert_eq!(game.state().current_player(), 0);
    }
}
