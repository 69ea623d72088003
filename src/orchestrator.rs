//! Game orchestration between players.

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use wallgo_rules::PlayerId;

use crate::players::{Player, PlayerAction};
use crate::{Dispatch, RulesEngine, SessionController, SessionError, Stage};

/// Messages sent from the orchestrator to whoever renders the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The session changed; carries the rendered board.
    StateChanged(String),
    /// An action did not fit and was dropped.
    ActionIgnored {
        /// Who sent it.
        player: String,
        /// What was sent.
        action: PlayerAction,
    },
    /// The game ended.
    GameOver {
        /// Winning seat.
        winner: PlayerId,
        /// Final territory per seat.
        scores: Vec<usize>,
    },
}

/// How an orchestrated session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The game was played to the end.
    Finished {
        /// Winning seat.
        winner: PlayerId,
        /// Final territory per seat.
        scores: Vec<usize>,
    },
    /// A player quit.
    Quit {
        /// Seat that quit.
        player: PlayerId,
    },
}

/// Runs a session with one [`Player`] per seat.
pub struct Orchestrator<E: RulesEngine + ?Sized> {
    controller: SessionController<E>,
    players: Vec<Box<dyn Player>>,
    event_tx: mpsc::UnboundedSender<GameEvent>,
    ignored_limit: usize,
}

impl<E: RulesEngine + ?Sized> Orchestrator<E> {
    /// Creates a new orchestrator; seat `i` is played by `players[i]`.
    pub fn new(
        controller: SessionController<E>,
        players: Vec<Box<dyn Player>>,
        event_tx: mpsc::UnboundedSender<GameEvent>,
    ) -> Self {
        Self {
            controller,
            players,
            event_tx,
            ignored_limit: 1000,
        }
    }

    /// Gives up after this many dropped actions in a row.
    pub fn with_ignored_limit(mut self, limit: usize) -> Self {
        self.ignored_limit = limit;
        self
    }

    /// The controller being driven.
    pub fn controller(&self) -> &SessionController<E> {
        &self.controller
    }

    fn emit(&self, event: GameEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No event listener");
        }
    }

    fn emit_state(&self) {
        self.emit(GameEvent::StateChanged(crate::render(self.controller.state())));
    }

    /// Runs the game loop until the game ends or someone quits.
    #[instrument(skip(self), fields(seats = self.players.len()))]
    pub async fn run(&mut self) -> Result<Outcome> {
        info!("Starting game orchestration");
        self.controller
            .connect()
            .await
            .context("Rules engine unavailable")?;
        self.controller.submit_options()?;
        self.check_seats()?;
        self.emit_state();

        let mut ignored = 0;
        loop {
            let state = self.controller.state();
            if let Stage::GameOver { winner, scores } = state.stage() {
                let outcome = Outcome::Finished {
                    winner: *winner,
                    scores: scores.clone().unwrap_or_default(),
                };
                info!(?outcome, "Game finished");
                self.emit(GameEvent::GameOver {
                    winner: *winner,
                    scores: scores.clone().unwrap_or_default(),
                });
                return Ok(outcome);
            }

            let Some(seat) = state.acting_player() else {
                // Back on the setup form after a reset.
                self.controller.submit_options()?;
                self.check_seats()?;
                self.emit_state();
                continue;
            };
            let player = self
                .players
                .get_mut(seat)
                .with_context(|| format!("No player for seat {seat}"))?;
            let name = player.name().to_string();

            debug!(player = %name, seat, "Waiting for action");
            let action = player.next_action(self.controller.state()).await?;
            if action == PlayerAction::Quit {
                info!(player = %name, "Player quit");
                return Ok(Outcome::Quit { player: seat });
            }

            match self.dispatch(action).await? {
                Dispatch::Applied => {
                    ignored = 0;
                    self.emit_state();
                }
                Dispatch::Ignored => {
                    ignored += 1;
                    warn!(player = %name, %action, "Action ignored");
                    self.emit(GameEvent::ActionIgnored {
                        player: name,
                        action,
                    });
                    if ignored >= self.ignored_limit {
                        anyhow::bail!("{ignored} actions in a row were ignored");
                    }
                }
            }
        }
    }

    async fn dispatch(&mut self, action: PlayerAction) -> Result<Dispatch, SessionError> {
        match action {
            PlayerAction::Place(cell) => self.controller.place_token(cell).await,
            PlayerAction::Select(cell) => self.controller.select_piece(cell).await,
            PlayerAction::Move(cell) => self.controller.submit_destination(cell).await,
            PlayerAction::Cancel => self.controller.cancel_selection(),
            PlayerAction::Wall(wall) => self.controller.place_wall(wall).await,
            PlayerAction::Reset => self.controller.reset().await,
            PlayerAction::Quit => Ok(Dispatch::Ignored),
        }
    }

    fn check_seats(&self) -> Result<()> {
        if let Stage::Placement(alloc) = self.controller.state().stage() {
            let needed = *alloc.options().num_players();
            if self.players.len() < needed {
                anyhow::bail!("{needed} players needed, {} seated", self.players.len());
            }
        }
        Ok(())
    }
}
