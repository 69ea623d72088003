//! Normalized view of one authoritative engine state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use wallgo_rules::{
    Cell, GameState, Grid, MAX_BOARD_SIZE, MAX_PLAYERS, MIN_BOARD_SIZE, MIN_PLAYERS, Orientation,
    Phase, PlacedWall, PlayerId, Wall,
};

use crate::EngineError;

/// One complete game state as reported by the rules engine.
///
/// Snapshots are immutable values; the session absorbs them whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Square grid side.
    pub board_size: usize,
    /// Cell occupancy, `[row][col]`.
    pub board: Grid,
    /// Player to act.
    pub current_player: PlayerId,
    /// Winner, once the game is over.
    pub winner: Option<PlayerId>,
    /// Walls on south edges.
    pub walls_h: BTreeSet<PlacedWall>,
    /// Walls on east edges.
    pub walls_v: BTreeSet<PlacedWall>,
    /// In-progress or just-completed move, at most two cells.
    pub move_path: Vec<Cell>,
    /// Whether the active player still owes a wall.
    pub wall_pending: bool,
    /// Engine phase.
    pub phase: Phase,
    /// Number of players.
    pub num_players: usize,
    /// Pieces each player places during setup.
    pub pieces_per_player: usize,
}

impl Snapshot {
    /// Checks the structural guarantees every snapshot must satisfy.
    #[instrument(skip(self), fields(board_size = self.board_size, phase = ?self.phase))]
    pub fn validate(&self) -> Result<(), EngineError> {
        let malformed = |reason: String| {
            warn!(%reason, "Rejecting malformed snapshot");
            Err(EngineError::Malformed(reason))
        };
        let size = self.board_size;

        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return malformed(format!("board size {size} out of range"));
        }
        if self.board.len() != size || self.board.iter().any(|row| row.len() != size) {
            return malformed(format!("board is not {size}x{size}"));
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.num_players) {
            return malformed(format!("{} players", self.num_players));
        }
        if self.pieces_per_player == 0 {
            return malformed("zero pieces per player".to_string());
        }
        if self.current_player >= self.num_players {
            return malformed(format!("current player {}", self.current_player));
        }
        if self.winner.is_some_and(|w| w >= self.num_players) {
            return malformed(format!("winner {:?}", self.winner));
        }
        if self
            .board
            .iter()
            .flatten()
            .flatten()
            .any(|&p| p >= self.num_players)
        {
            return malformed("piece owned by unknown player".to_string());
        }
        let walls = self
            .walls_h
            .iter()
            .map(|w| Wall::new(Orientation::H, w.cell))
            .chain(self.walls_v.iter().map(|w| Wall::new(Orientation::V, w.cell)));
        for wall in walls {
            if !wall.is_interior(size) {
                return malformed(format!("wall {wall} off the board"));
            }
        }
        if self.move_path.len() > 2 {
            return malformed(format!("move path of {} cells", self.move_path.len()));
        }
        if self.move_path.iter().any(|cell| !cell.in_bounds(size)) {
            return malformed("move path leaves the board".to_string());
        }
        if self.wall_pending && self.move_path.is_empty() {
            return malformed("wall pending without a move".to_string());
        }
        Ok(())
    }

    /// Who occupies `cell`, if anyone.
    pub fn occupant(&self, cell: Cell) -> Option<PlayerId> {
        self.board
            .get(cell.row)
            .and_then(|row| row.get(cell.col))
            .copied()
            .flatten()
    }

    /// Cells holding a piece of `player`, in row-major order.
    pub fn pieces_of(&self, player: PlayerId) -> Vec<Cell> {
        self.board
            .iter()
            .enumerate()
            .flat_map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .filter(move |(_, occupant)| **occupant == Some(player))
                    .map(move |(col, _)| Cell::new(row, col))
            })
            .collect()
    }

    /// Tail of the move path: the cell the last move ended on.
    pub fn last_moved(&self) -> Option<Cell> {
        self.move_path.last().copied()
    }

    /// Whether a wall already sits on the given edge.
    pub fn has_wall(&self, wall: Wall) -> bool {
        let walls = match wall.orientation {
            Orientation::H => &self.walls_h,
            Orientation::V => &self.walls_v,
        };
        walls.iter().any(|placed| placed.cell == wall.cell)
    }

    /// Unwalled interior edges around `cell`, in north, south, west, east order.
    pub fn open_edges(&self, cell: Cell) -> Vec<Wall> {
        Wall::around(cell, self.board_size)
            .filter(|&wall| !self.has_wall(wall))
            .collect()
    }
}

impl From<&GameState> for Snapshot {
    fn from(state: &GameState) -> Self {
        Self {
            board_size: state.board_size(),
            board: state.board().clone(),
            current_player: state.current_player(),
            winner: state.winner(),
            walls_h: state.walls_h().iter().copied().collect(),
            walls_v: state.walls_v().iter().copied().collect(),
            move_path: state.move_path().to_vec(),
            wall_pending: state.wall_pending(),
            phase: state.phase(),
            num_players: state.num_players(),
            pieces_per_player: state.pieces_per_player(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot::from(&GameState::new())
    }

    #[test]
    fn test_default_state_is_valid() {
        assert!(snapshot().validate().is_ok());
    }

    #[test]
    fn test_rejects_ragged_board() {
        let mut snap = snapshot();
        snap.board[2].pop();
        assert!(matches!(snap.validate(), Err(EngineError::Malformed(_))));
    }

    #[test]
    fn test_rejects_wall_pending_without_move() {
        let mut snap = snapshot();
        snap.wall_pending = true;
        assert!(snap.validate().is_err());
    }

    #[test]
    fn test_rejects_border_wall() {
        let mut snap = snapshot();
        snap.walls_h.insert(PlacedWall::new(Cell::new(6, 0), 0));
        assert!(snap.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_player() {
        let mut snap = snapshot();
        snap.board[0][0] = Some(3);
        assert!(snap.validate().is_err());
    }

    #[test]
    fn test_parses_engine_json() {
        let json = r#"{
            "board_size": 5,
            "board": [[0,null,null,null,null],[null,null,null,null,null],
                      [null,null,null,null,null],[null,null,null,null,null],
                      [null,null,null,null,1]],
            "current_player": 1,
            "winner": null,
            "walls_h": [[0,0,0]],
            "walls_v": [],
            "move_path": [[4,4]],
            "wall_pending": true,
            "phase": "Main",
            "num_players": 2,
            "pieces_per_player": 1
        }"#;
        let snap: Snapshot = serde_json::from_str(json).unwrap();
        assert!(snap.validate().is_ok());
        assert_eq!(snap.last_moved(), Some(Cell::new(4, 4)));
        assert_eq!(snap.pieces_of(0), vec![Cell::new(0, 0)]);
        assert!(snap.has_wall(Wall::new(Orientation::H, Cell::new(0, 0))));
    }

    #[test]
    fn test_open_edges_skip_walls() {
        let mut snap = snapshot();
        snap.walls_v.insert(PlacedWall::new(Cell::new(3, 3), 1));
        let edges = snap.open_edges(Cell::new(3, 3));
        assert_eq!(edges.len(), 3);
        assert!(!edges.contains(&Wall::new(Orientation::V, Cell::new(3, 3))));
    }
}
