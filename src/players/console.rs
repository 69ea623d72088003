//! Human player typing commands on the terminal.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use wallgo_rules::{Cell, Orientation, Wall};

use super::{Player, PlayerAction};
use crate::{Interaction, SessionState, Stage};

/// Shared line source; every console seat reads from the same terminal.
pub type ConsoleInput = Arc<Mutex<mpsc::UnboundedReceiver<String>>>;

const HELP: &str = "commands: place R C | select R C | move R C | R C | cancel | wall h|v R C | reset | quit";

/// Human player reading commands line by line.
pub struct ConsolePlayer {
    name: String,
    input: ConsoleInput,
}

impl ConsolePlayer {
    /// Creates a console player reading from `input`.
    pub fn new(name: impl Into<String>, input: ConsoleInput) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }

    /// Spawns a task forwarding stdin lines, and returns the shared receiver.
    pub fn stdin_input() -> ConsoleInput {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
        });
        Arc::new(Mutex::new(rx))
    }
}

/// Parses one command line in the context of the current stage.
///
/// A bare `R C` means whatever a click on that cell would mean right now.
pub fn parse_command(line: &str, stage: &Stage) -> Option<PlayerAction> {
    fn cell(row: &str, col: &str) -> Option<Cell> {
        Some(Cell::new(row.parse().ok()?, col.parse().ok()?))
    }

    let words: Vec<&str> = line.split_whitespace().collect();

    match words.as_slice() {
        ["place", r, c] => cell(r, c).map(PlayerAction::Place),
        ["select", r, c] => cell(r, c).map(PlayerAction::Select),
        ["move", r, c] => cell(r, c).map(PlayerAction::Move),
        ["wall", o, r, c] => {
            let orientation = Orientation::from_str(o).ok()?;
            cell(r, c).map(|cell| PlayerAction::Wall(Wall::new(orientation, cell)))
        }
        ["cancel"] => Some(PlayerAction::Cancel),
        ["reset"] => Some(PlayerAction::Reset),
        ["quit"] | ["q"] => Some(PlayerAction::Quit),
        [r, c] => {
            let cell = cell(r, c)?;
            match stage {
                Stage::Placement(_) => Some(PlayerAction::Place(cell)),
                Stage::Main(Interaction::NoSelection) => Some(PlayerAction::Select(cell)),
                Stage::Main(Interaction::PieceSelected { .. }) => Some(PlayerAction::Move(cell)),
                _ => None,
            }
        }
        _ => None,
    }
}

#[async_trait::async_trait]
impl Player for ConsolePlayer {
    async fn next_action(&mut self, state: &SessionState) -> Result<PlayerAction> {
        let prompt = match state.interaction() {
            Some(interaction) => interaction.kind().to_string(),
            None => state.stage().label().to_string(),
        };
        println!("{} ({prompt})> ", self.name);

        let mut input = self.input.lock().await;
        while let Some(line) = input.recv().await {
            match parse_command(&line, state.stage()) {
                Some(action) => {
                    debug!(player = %self.name, %action, "Console command");
                    return Ok(action);
                }
                None => println!("{HELP}"),
            }
        }

        anyhow::bail!("Input closed")
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SetupAllocator, SetupOptions};

    #[test]
    fn test_bare_cell_follows_stage() {
        let cell = Cell::new(2, 3);
        let placement = Stage::Placement(SetupAllocator::new(SetupOptions::clamped(7, 2, 2)));
        assert_eq!(parse_command("2 3", &placement), Some(PlayerAction::Place(cell)));

        let selecting = Stage::Main(Interaction::NoSelection);
        assert_eq!(parse_command(" 2 3 ", &selecting), Some(PlayerAction::Select(cell)));

        let moving = Stage::Main(Interaction::PieceSelected {
            source: cell,
            destinations: None,
        });
        assert_eq!(parse_command("2 3", &moving), Some(PlayerAction::Move(cell)));
    }

    #[test]
    fn test_explicit_commands() {
        let stage = Stage::Main(Interaction::NoSelection);
        assert_eq!(
            parse_command("wall v 1 4", &stage),
            Some(PlayerAction::Wall(Wall::new(Orientation::V, Cell::new(1, 4))))
        );
        assert_eq!(parse_command("cancel", &stage), Some(PlayerAction::Cancel));
        assert_eq!(parse_command("wall x 1 4", &stage), None);
        assert_eq!(parse_command("move a b", &stage), None);
    }

    #[tokio::test]
    async fn test_skips_garbage_lines() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("hello".to_string()).unwrap();
        tx.send("select 1 1".to_string()).unwrap();
        let mut player = ConsolePlayer::new("Ann", Arc::new(Mutex::new(rx)));
        let state = SessionState::new(SetupOptions::clamped(7, 2, 2));
        let action = player.next_action(&state).await.unwrap();
        assert_eq!(action, PlayerAction::Select(Cell::new(1, 1)));
    }
}
