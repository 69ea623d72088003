//! Bot that always takes the first legal option.

use std::time::Duration;

use anyhow::Result;
use tracing::debug;
use wallgo_rules::Cell;

use super::{Player, PlayerAction};
use crate::{Interaction, SessionState, Stage};

/// Deterministic bot: first free cell, first movable piece, first wall.
///
/// When moving it prefers leaving the cell over staying in place.
pub struct FirstLegalPlayer {
    name: String,
    delay: Duration,
}

impl FirstLegalPlayer {
    /// Creates a bot that answers immediately.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delay: Duration::ZERO,
        }
    }

    /// Pauses this long before every action, so games can be watched.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl Player for FirstLegalPlayer {
    async fn next_action(&mut self, state: &SessionState) -> Result<PlayerAction> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let action = match state.stage() {
            Stage::Placement(alloc) => {
                let size = *alloc.options().board_size();
                let free = (0..size)
                    .flat_map(|row| (0..size).map(move |col| Cell::new(row, col)))
                    .find(|&cell| alloc.can_place(cell));
                match free {
                    Some(cell) => PlayerAction::Place(cell),
                    None => anyhow::bail!("No free cell to place on"),
                }
            }
            Stage::Main(Interaction::NoSelection) => match state.selectable().first() {
                Some(&cell) => PlayerAction::Select(cell),
                None => anyhow::bail!("No movable piece"),
            },
            Stage::Main(Interaction::PieceSelected {
                source,
                destinations: Some(legal),
            }) => {
                let target = legal
                    .iter()
                    .find(|&cell| cell != source)
                    .unwrap_or(source);
                PlayerAction::Move(*target)
            }
            Stage::Main(Interaction::PieceSelected { .. }) => PlayerAction::Cancel,
            Stage::Main(Interaction::WallPending { candidates, .. }) => match candidates.first() {
                Some(&wall) => PlayerAction::Wall(wall),
                None => anyhow::bail!("No open edge for the owed wall"),
            },
            Stage::Options(_) | Stage::GameOver { .. } => PlayerAction::Quit,
        };

        debug!(bot = %self.name, %action, "Bot chose action");
        Ok(action)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SetupOptions;

    #[tokio::test]
    async fn test_places_on_first_free_cell() {
        let mut state = SessionState::new(SetupOptions::clamped(5, 2, 1));
        let mut alloc = crate::SetupAllocator::new(SetupOptions::clamped(5, 2, 1));
        alloc.place_token(Cell::new(0, 0)).unwrap();
        state.set_stage(Stage::Placement(alloc));

        let mut bot = FirstLegalPlayer::new("Bot");
        let action = bot.next_action(&state).await.unwrap();
        assert_eq!(action, PlayerAction::Place(Cell::new(0, 1)));
    }

    #[tokio::test]
    async fn test_prefers_leaving_over_staying() {
        let mut state = SessionState::new(SetupOptions::clamped(5, 2, 1));
        let source = Cell::new(2, 2);
        state.set_stage(Stage::Main(Interaction::PieceSelected {
            source,
            destinations: Some([Cell::new(1, 2), source].into_iter().collect()),
        }));

        let mut bot = FirstLegalPlayer::new("Bot");
        let action = bot.next_action(&state).await.unwrap();
        assert_eq!(action, PlayerAction::Move(Cell::new(1, 2)));
    }
}
