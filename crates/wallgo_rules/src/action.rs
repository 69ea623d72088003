//! Rejections raised by the rules engine.

use super::{Cell, Phase, PlayerId, Wall};

/// Error returned when an operation breaks the rules.
///
/// A rejected operation never mutates the game.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RuleError {
    /// The operation needs a different phase.
    #[display("Operation requires the {:?} phase", _0)]
    WrongPhase(Phase),

    /// The game already has a winner.
    #[display("Game is already over")]
    GameOver,

    /// A wall must be placed before anything else happens.
    #[display("A wall must be placed first")]
    WallPending,

    /// No move is waiting for a wall.
    #[display("No wall is pending")]
    NoWallPending,

    /// A move path must hold one or two cells.
    #[display("Move path must have 1 or 2 cells, got {}", _0)]
    PathLength(usize),

    /// A cell lies outside the board.
    #[display("Cell {} is off the board", _0)]
    OutOfBounds(Cell),

    /// The moving piece does not belong to the current player.
    #[display("Cell {} does not hold a piece of player {}", _0, _1)]
    NotOwned(Cell, PlayerId),

    /// The destination cannot be reached this turn.
    #[display("Cannot reach {} from {}", _1, _0)]
    Unreachable(Cell, Cell),

    /// The wall is occupied, off the border, or away from the moved piece.
    #[display("Wall {} cannot be placed", _0)]
    IllegalWall(Wall),

    /// Board parameters are outside the supported ranges.
    #[display("Invalid board parameters: {}", _0)]
    InvalidParameters(String),
}

impl std::error::Error for RuleError {}
