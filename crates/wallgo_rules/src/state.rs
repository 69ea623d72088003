//! Authoritative game record.

use super::{
    Cell, Grid, Orientation, Phase, PlacedWall, PlayerId, Wall, DEFAULT_BOARD_SIZE,
    DEFAULT_PIECES_PER_PLAYER, DEFAULT_PLAYERS, empty_grid,
};
use serde::{Deserialize, Serialize};

/// Complete game state, as handed out after every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub(crate) board: Grid,
    pub(crate) board_size: usize,
    pub(crate) current_player: PlayerId,
    pub(crate) winner: Option<PlayerId>,
    pub(crate) walls_h: Vec<PlacedWall>,
    pub(crate) walls_v: Vec<PlacedWall>,
    pub(crate) phase: Phase,
    pub(crate) move_path: Vec<Cell>,
    pub(crate) wall_pending: bool,
    pub(crate) num_players: usize,
    pub(crate) pieces_per_player: usize,
}

impl GameState {
    /// Creates a fresh setup-phase state on an empty default board.
    pub fn new() -> Self {
        Self {
            board: empty_grid(DEFAULT_BOARD_SIZE),
            board_size: DEFAULT_BOARD_SIZE,
            current_player: 0,
            winner: None,
            walls_h: Vec::new(),
            walls_v: Vec::new(),
            phase: Phase::Setup,
            move_path: Vec::new(),
            wall_pending: false,
            num_players: DEFAULT_PLAYERS,
            pieces_per_player: DEFAULT_PIECES_PER_PLAYER,
        }
    }

    /// Returns the occupancy grid.
    pub fn board(&self) -> &Grid {
        &self.board
    }

    /// Returns the board side length.
    pub fn board_size(&self) -> usize {
        self.board_size
    }

    /// Returns the player to act.
    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    /// Returns the winner, once the game is over.
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Returns walls on south edges.
    pub fn walls_h(&self) -> &[PlacedWall] {
        &self.walls_h
    }

    /// Returns walls on east edges.
    pub fn walls_v(&self) -> &[PlacedWall] {
        &self.walls_v
    }

    /// Returns the phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the path of the move awaiting (or just given) a wall.
    pub fn move_path(&self) -> &[Cell] {
        &self.move_path
    }

    /// Whether the current player owes a wall.
    pub fn wall_pending(&self) -> bool {
        self.wall_pending
    }

    /// Returns the number of players.
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// Returns the number of pieces each player places.
    pub fn pieces_per_player(&self) -> usize {
        self.pieces_per_player
    }

    /// Returns who occupies `cell`, if anyone.
    pub fn occupant(&self, cell: Cell) -> Option<PlayerId> {
        self.board
            .get(cell.row)
            .and_then(|row| row.get(cell.col))
            .copied()
            .flatten()
    }

    /// Whether a wall already sits on the given edge.
    pub fn wall_exists(&self, wall: Wall) -> bool {
        let walls = match wall.orientation {
            Orientation::H => &self.walls_h,
            Orientation::V => &self.walls_v,
        };
        walls.iter().any(|placed| placed.cell == wall.cell)
    }

    /// Formats the board as plain text.
    ///
    /// Pieces print as their player index, empty cells as `.`,
    /// walls as `|` (east edge) and `-` (south edge).
    pub fn display(&self) -> String {
        let size = self.board_size;
        let mut out = String::new();
        for row in 0..size {
            for col in 0..size {
                let cell = Cell::new(row, col);
                match self.occupant(cell) {
                    Some(player) => out.push_str(&player.to_string()),
                    None => out.push('.'),
                }
                if col + 1 < size {
                    let east = Wall::new(Orientation::V, cell);
                    out.push(if self.wall_exists(east) { '|' } else { ' ' });
                }
            }
            out.push('\n');
            if row + 1 < size {
                for col in 0..size {
                    let south = Wall::new(Orientation::H, Cell::new(row, col));
                    out.push(if self.wall_exists(south) { '-' } else { ' ' });
                    if col + 1 < size {
                        out.push(' ');
                    }
                }
                out.push('\n');
            }
        }
        out
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
