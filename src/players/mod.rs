//! Player trait and implementations.

mod console;
mod first_legal;

pub use console::{ConsoleInput, ConsolePlayer, parse_command};
pub use first_legal::FirstLegalPlayer;

use std::fmt;

use anyhow::Result;
use wallgo_rules::{Cell, Wall};

use crate::SessionState;

/// One input a player hands to the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    /// Place a setup token.
    Place(Cell),
    /// Select a piece to move.
    Select(Cell),
    /// Move the selected piece (its own cell to stay in place).
    Move(Cell),
    /// Drop the current selection.
    Cancel,
    /// Place the owed wall.
    Wall(Wall),
    /// Reset the session to the setup form.
    Reset,
    /// Leave the session.
    Quit,
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Place(cell) => write!(f, "place {cell}"),
            Self::Select(cell) => write!(f, "select {cell}"),
            Self::Move(cell) => write!(f, "move {cell}"),
            Self::Cancel => write!(f, "cancel"),
            Self::Wall(wall) => write!(f, "wall {wall}"),
            Self::Reset => write!(f, "reset"),
            Self::Quit => write!(f, "quit"),
        }
    }
}

/// Trait for anything that can act for a seat at the board.
#[async_trait::async_trait]
pub trait Player: Send {
    /// Picks the next action, given the session as it stands.
    ///
    /// Only called while this player is the one expected to act.
    async fn next_action(&mut self, state: &SessionState) -> Result<PlayerAction>;

    /// Returns the player's display name.
    fn name(&self) -> &str;
}
