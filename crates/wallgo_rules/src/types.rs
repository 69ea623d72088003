//! Core domain types for wall-go.

use derive_new::new;
use serde::{Deserialize, Serialize};

/// Index of a player, `0..num_players`.
pub type PlayerId = usize;

/// Cell occupancy grid, indexed `[row][col]`.
pub type Grid = Vec<Vec<Option<PlayerId>>>;

/// Smallest playable board side.
pub const MIN_BOARD_SIZE: usize = 5;
/// Largest playable board side.
pub const MAX_BOARD_SIZE: usize = 15;
/// Board side used when nothing else is configured.
pub const DEFAULT_BOARD_SIZE: usize = 7;
/// Fewest players in a session.
pub const MIN_PLAYERS: usize = 2;
/// Most players in a session.
pub const MAX_PLAYERS: usize = 4;
/// Player count used when nothing else is configured.
pub const DEFAULT_PLAYERS: usize = 2;
/// Pieces per player used when nothing else is configured.
pub const DEFAULT_PIECES_PER_PLAYER: usize = 2;

/// Creates an empty `size` x `size` grid.
pub fn empty_grid(size: usize) -> Grid {
    vec![vec![None; size]; size]
}

/// A board coordinate.
///
/// Serializes as a `[row, col]` pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, new,
)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Cell {
    /// Row index, top to bottom.
    pub row: usize,
    /// Column index, left to right.
    pub col: usize,
}

impl Cell {
    /// Orthogonal neighbours that fall inside a `size` x `size` board.
    pub fn neighbours(self, size: usize) -> impl Iterator<Item = Cell> {
        let Cell { row, col } = self;
        [
            row.checked_sub(1).map(|r| Cell::new(r, col)),
            (row + 1 < size).then(|| Cell::new(row + 1, col)),
            col.checked_sub(1).map(|c| Cell::new(row, c)),
            (col + 1 < size).then(|| Cell::new(row, col + 1)),
        ]
        .into_iter()
        .flatten()
    }

    /// Whether the cell lies on a `size` x `size` board.
    pub fn in_bounds(self, size: usize) -> bool {
        self.row < size && self.col < size
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<Cell> for (usize, usize) {
    fn from(cell: Cell) -> Self {
        (cell.row, cell.col)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Which edge of a cell a wall sits on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Orientation {
    /// South edge of the cell.
    #[serde(rename = "h")]
    #[strum(serialize = "h")]
    H,
    /// East edge of the cell.
    #[serde(rename = "v")]
    #[strum(serialize = "v")]
    V,
}

/// An edge position on the board, independent of who placed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, new)]
pub struct Wall {
    /// Edge orientation.
    pub orientation: Orientation,
    /// Cell whose south (`H`) or east (`V`) edge is walled.
    pub cell: Cell,
}

impl Wall {
    /// Whether the wall sits on an interior edge of a `size` board.
    ///
    /// Edges on the outer border are never wallable.
    pub fn is_interior(self, size: usize) -> bool {
        match self.orientation {
            Orientation::H => self.cell.row + 1 < size && self.cell.col < size,
            Orientation::V => self.cell.col + 1 < size && self.cell.row < size,
        }
    }

    /// The interior edges touching `cell`, in north, south, west, east order.
    pub fn around(cell: Cell, size: usize) -> impl Iterator<Item = Wall> {
        let Cell { row, col } = cell;
        [
            row.checked_sub(1)
                .map(|r| Wall::new(Orientation::H, Cell::new(r, col))),
            Some(Wall::new(Orientation::H, cell)),
            col.checked_sub(1)
                .map(|c| Wall::new(Orientation::V, Cell::new(row, c))),
            Some(Wall::new(Orientation::V, cell)),
        ]
        .into_iter()
        .flatten()
        .filter(move |wall| wall.is_interior(size))
    }
}

impl std::fmt::Display for Wall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.orientation, self.cell)
    }
}

/// A wall that has been placed, tagged with its owner.
///
/// Serializes as a `[row, col, owner]` triple.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, new,
)]
#[serde(from = "(usize, usize, PlayerId)", into = "(usize, usize, PlayerId)")]
pub struct PlacedWall {
    /// Cell the wall is anchored to.
    pub cell: Cell,
    /// Player who placed it.
    pub owner: PlayerId,
}

impl From<(usize, usize, PlayerId)> for PlacedWall {
    fn from((row, col, owner): (usize, usize, PlayerId)) -> Self {
        Self {
            cell: Cell::new(row, col),
            owner,
        }
    }
}

impl From<PlacedWall> for (usize, usize, PlayerId) {
    fn from(wall: PlacedWall) -> Self {
        (wall.cell.row, wall.cell.col, wall.owner)
    }
}

/// Game phase as tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Pieces are still being placed.
    #[default]
    Setup,
    /// Move-then-wall turns.
    Main,
}
