//! Session controller: the single writer of [`SessionState`].
//!
//! Every user action is checked against the current stage first. Inputs that
//! do not fit come back as [`Dispatch::Ignored`] without any engine call.
//! Inputs that fit issue exactly one state-changing engine call, and the
//! snapshot it returns is absorbed before anything else is derived from it.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use wallgo_rules::{Cell, Wall};

use crate::{
    Interaction, RulesEngine, SelectableBatch, SelectableQuery, SessionConfig, SessionError,
    SessionState, SetupCompletion, SetupOptions, Snapshot, Stage,
};

/// Whether the rules engine is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Readiness {
    /// [`SessionController::connect`] has not succeeded yet.
    Pending,
    /// The engine answered; actions are allowed.
    Ready,
    /// The engine failed to come up; the session cannot proceed.
    Failed,
}

/// What happened to a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The action fit the current stage and was carried out.
    Applied,
    /// The action did not fit the current stage and was dropped.
    Ignored,
}

/// What happened to a resolved selectable batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The batch was current and is now the selectable set.
    Applied,
    /// A newer snapshot arrived meanwhile; the batch was dropped.
    Stale,
    /// Nobody could move, so the turn was passed on.
    AutoSkipped,
}

/// Drives one wall-go session against a rules engine.
#[derive(Debug)]
pub struct SessionController<E: RulesEngine + ?Sized> {
    engine: Arc<E>,
    config: SessionConfig,
    state: SessionState,
    readiness: Readiness,
    skipped_generation: Option<u64>,
    consecutive_skips: usize,
    scores_requested: bool,
}

impl<E: RulesEngine + ?Sized> SessionController<E> {
    /// Creates a controller; call [`connect`](Self::connect) before anything else.
    #[instrument(skip(engine))]
    pub fn new(engine: Arc<E>, config: SessionConfig) -> Self {
        info!("Creating session controller");
        Self {
            state: SessionState::new(config.setup_options()),
            engine,
            config,
            readiness: Readiness::Pending,
            skipped_generation: None,
            consecutive_skips: 0,
            scores_requested: false,
        }
    }

    /// Session state, for rendering and decisions.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether the engine is usable.
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// The engine handle.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Fetches the first engine state; until this succeeds every action is refused.
    ///
    /// The engine may already be mid-game, so the first snapshot is refreshed
    /// like any other: selectable pieces are resolved (skipping a stuck player)
    /// and final scores are fetched if somebody has already won.
    #[instrument(skip(self))]
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        let snapshot = match self.engine.get_state().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Rules engine failed to start");
                self.readiness = Readiness::Failed;
                return Err(SessionError::NotReady);
            }
        };
        if let Err(e) = self.absorb(snapshot) {
            self.readiness = Readiness::Failed;
            error!(error = %e, "Rules engine answered with an unusable state");
            return Err(SessionError::NotReady);
        }
        self.readiness = Readiness::Ready;
        info!("Rules engine ready");
        self.refresh().await
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        match self.readiness {
            Readiness::Ready => Ok(()),
            _ => Err(SessionError::NotReady),
        }
    }

    /// Validates and absorbs a snapshot; returns whether anything changed.
    fn absorb(&mut self, snapshot: Snapshot) -> Result<bool, SessionError> {
        snapshot.validate().map_err(SessionError::engine)?;
        Ok(self.state.reconcile(snapshot))
    }

    /// Re-reads the engine state and refreshes everything derived from it.
    #[instrument(skip(self))]
    pub async fn sync(&mut self) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let snapshot = self.engine.get_state().await.map_err(SessionError::engine)?;
        self.absorb(snapshot)?;
        self.refresh().await
    }

    // ── setup ────────────────────────────────────────────────

    /// Edits the setup options.
    ///
    /// Allowed on the setup form, and during placement until the first token is down.
    #[instrument(skip(self))]
    pub fn change_options(&mut self, options: SetupOptions) -> Result<Dispatch, SessionError> {
        self.ensure_ready()?;
        let applied = match self.state.stage_mut() {
            Stage::Options(current) => {
                *current = options;
                true
            }
            Stage::Placement(alloc) => alloc.reconfigure(options),
            _ => false,
        };
        Ok(if applied {
            Dispatch::Applied
        } else {
            Dispatch::Ignored
        })
    }

    /// Submits the setup form and starts placement.
    #[instrument(skip(self))]
    pub fn submit_options(&mut self) -> Result<Dispatch, SessionError> {
        self.ensure_ready()?;
        let Stage::Options(options) = self.state.stage() else {
            debug!(stage = self.state.stage().label(), "No setup form to submit");
            return Ok(Dispatch::Ignored);
        };
        let alloc = crate::SetupAllocator::new(*options);
        self.state.set_stage(Stage::Placement(alloc));
        Ok(Dispatch::Applied)
    }

    /// Places a setup token for the drafting player.
    ///
    /// The last token commits the board to the engine and starts the main phase.
    #[instrument(skip(self))]
    pub async fn place_token(&mut self, cell: Cell) -> Result<Dispatch, SessionError> {
        self.ensure_ready()?;
        let Stage::Placement(alloc) = self.state.stage_mut() else {
            return Ok(Dispatch::Ignored);
        };
        if alloc.place_token(cell).is_none() {
            return Ok(Dispatch::Ignored);
        }
        if let Some(completion) = alloc.take_completion() {
            self.start_main(completion).await?;
        }
        Ok(Dispatch::Applied)
    }

    async fn start_main(&mut self, completion: SetupCompletion) -> Result<(), SessionError> {
        let SetupCompletion {
            board,
            starting_player,
            options,
        } = completion;
        info!(starting_player, "Committing setup board");
        self.engine
            .commit_board_and_start_main(
                board,
                starting_player,
                *options.num_players(),
                *options.pieces_per_player(),
                *options.board_size(),
            )
            .await
            .map_err(SessionError::engine)?;
        self.engine
            .start_main_phase()
            .await
            .map_err(SessionError::engine)?;
        let snapshot = self.engine.get_state().await.map_err(SessionError::engine)?;
        self.absorb(snapshot)?;
        self.refresh().await
    }

    // ── main phase ───────────────────────────────────────────

    /// Selects one of the active player's movable pieces.
    #[instrument(skip(self))]
    pub async fn select_piece(&mut self, cell: Cell) -> Result<Dispatch, SessionError> {
        self.ensure_ready()?;
        let next = match self.state.interaction() {
            Some(interaction) if self.state.selectable_is_current() => {
                interaction.select(cell, self.state.selectable())
            }
            _ => None,
        };
        let Some(next) = next else {
            return Ok(Dispatch::Ignored);
        };
        self.state.set_stage(Stage::Main(next));
        self.load_destinations().await?;
        Ok(Dispatch::Applied)
    }

    /// Drops the current selection without contacting the engine.
    #[instrument(skip(self))]
    pub fn cancel_selection(&mut self) -> Result<Dispatch, SessionError> {
        self.ensure_ready()?;
        match self.state.interaction().and_then(Interaction::cancel) {
            Some(next) => {
                self.state.set_stage(Stage::Main(next));
                Ok(Dispatch::Applied)
            }
            None => Ok(Dispatch::Ignored),
        }
    }

    /// Moves the selected piece to `destination` (itself to stay in place).
    #[instrument(skip(self))]
    pub async fn submit_destination(&mut self, destination: Cell) -> Result<Dispatch, SessionError> {
        self.ensure_ready()?;
        let Some(path) = self
            .state
            .interaction()
            .and_then(|interaction| interaction.move_path(destination))
        else {
            return Ok(Dispatch::Ignored);
        };

        debug!(?path, "Submitting move");
        let snapshot = self
            .engine
            .move_piece(&path)
            .await
            .map_err(SessionError::engine)?;
        // The selection is spent whatever the engine made of it.
        self.state.set_stage(Stage::Main(Interaction::NoSelection));
        if !self.absorb(snapshot)? {
            warn!(?path, "Engine kept its state after the move");
        }
        self.refresh().await?;
        Ok(Dispatch::Applied)
    }

    /// Places the owed wall.
    #[instrument(skip(self))]
    pub async fn place_wall(&mut self, wall: Wall) -> Result<Dispatch, SessionError> {
        self.ensure_ready()?;
        let fits = self
            .state
            .interaction()
            .is_some_and(|interaction| interaction.accepts_wall(wall));
        if !fits {
            debug!(%wall, "Wall does not fit");
            return Ok(Dispatch::Ignored);
        }

        let snapshot = self
            .engine
            .place_wall(wall)
            .await
            .map_err(SessionError::engine)?;
        if !self.absorb(snapshot)? {
            warn!(%wall, "Engine kept its state after the wall");
        }
        self.refresh().await?;
        Ok(Dispatch::Applied)
    }

    /// Resets the engine and returns to the setup form.
    #[instrument(skip(self))]
    pub async fn reset(&mut self) -> Result<Dispatch, SessionError> {
        self.ensure_ready()?;
        let snapshot = self.engine.reset().await.map_err(SessionError::engine)?;
        self.state
            .set_stage(Stage::Options(self.config.setup_options()));
        self.skipped_generation = None;
        self.consecutive_skips = 0;
        self.scores_requested = false;
        self.absorb(snapshot)?;
        info!("Session reset");
        Ok(Dispatch::Applied)
    }

    // ── derived state ────────────────────────────────────────

    /// Brings everything derived from the current snapshot up to date.
    ///
    /// Resolves selectable pieces (auto-skipping a stuck player), loads the
    /// selected piece's destinations, and fetches final scores after a win.
    #[instrument(skip(self), fields(generation = self.state.generation()))]
    pub async fn refresh(&mut self) -> Result<(), SessionError> {
        loop {
            if let Some(query) = self.begin_resolution() {
                let batch = query
                    .run(&*self.engine, *self.config.max_concurrent_queries())
                    .await
                    .map_err(SessionError::engine)?;
                if self.apply_resolution(batch).await? == Resolution::AutoSkipped {
                    continue;
                }
            }
            break;
        }

        self.load_destinations().await?;

        if matches!(self.state.stage(), Stage::GameOver { scores: None, .. })
            && !self.scores_requested
        {
            self.scores_requested = true;
            let scores = self
                .engine
                .region_scores()
                .await
                .map_err(SessionError::engine)?;
            info!(?scores, "Final region scores");
            self.state.apply_scores(scores);
        }
        Ok(())
    }

    /// Legality queries for the current snapshot, if selectable pieces are due.
    ///
    /// Due while a piece is to be selected or moved and the current generation
    /// has not been resolved yet.
    pub fn begin_resolution(&self) -> Option<SelectableQuery> {
        let interaction = self.state.interaction()?;
        if matches!(interaction, Interaction::WallPending { .. })
            || self.state.selectable_is_current()
        {
            return None;
        }
        let snapshot = self.state.snapshot().as_ref()?;
        Some(SelectableQuery::for_snapshot(
            snapshot,
            *self.state.generation(),
        ))
    }

    /// Applies a finished legality batch.
    ///
    /// A batch from an older generation is dropped. A current batch with no
    /// movable piece passes the turn on, at most once per generation.
    #[instrument(skip(self, batch), fields(batch_generation = batch.generation()))]
    pub async fn apply_resolution(
        &mut self,
        batch: SelectableBatch,
    ) -> Result<Resolution, SessionError> {
        let generation = batch.generation();
        if generation != *self.state.generation() {
            debug!(
                current = *self.state.generation(),
                "Discarding stale selectable batch"
            );
            return Ok(Resolution::Stale);
        }

        if !batch.is_stuck() {
            self.consecutive_skips = 0;
            self.state
                .apply_selectable(generation, batch.into_selectable());
            return Ok(Resolution::Applied);
        }

        self.state
            .apply_selectable(generation, Default::default());
        if self.skipped_generation == Some(generation) {
            return Ok(Resolution::Applied);
        }

        let num_players = self
            .state
            .snapshot()
            .as_ref()
            .map_or(1, |snap| snap.num_players);
        self.consecutive_skips += 1;
        if self.consecutive_skips > num_players {
            error!(skipped = self.consecutive_skips, "No player can move");
            return Err(SessionError::Stalemate {
                skipped: self.consecutive_skips,
            });
        }

        info!(player = batch.player(), "No movable piece, passing the turn");
        self.skipped_generation = Some(generation);
        let snapshot = self
            .engine
            .advance_turn()
            .await
            .map_err(SessionError::engine)?;
        self.absorb(snapshot)?;
        Ok(Resolution::AutoSkipped)
    }

    async fn load_destinations(&mut self) -> Result<(), SessionError> {
        let source = match self.state.interaction() {
            Some(Interaction::PieceSelected {
                source,
                destinations: None,
            }) => *source,
            _ => return Ok(()),
        };
        let generation = *self.state.generation();
        let destinations = self
            .engine
            .legal_destinations(source)
            .await
            .map_err(SessionError::engine)?;
        debug!(%source, count = destinations.len(), "Destinations loaded");
        self.state
            .apply_destinations(generation, source, destinations);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalEngine;

    fn controller() -> SessionController<LocalEngine> {
        SessionController::new(Arc::new(LocalEngine::new()), SessionConfig::new())
    }

    #[tokio::test]
    async fn test_actions_refused_before_connect() {
        let mut session = controller();
        assert_eq!(session.submit_options(), Err(SessionError::NotReady));
        assert_eq!(
            session.place_token(Cell::new(0, 0)).await,
            Err(SessionError::NotReady)
        );
    }

    #[tokio::test]
    async fn test_failed_engine_blocks_session() {
        let mut session =
            SessionController::new(Arc::new(LocalEngine::unavailable()), SessionConfig::new());
        assert_eq!(session.connect().await, Err(SessionError::NotReady));
        assert_eq!(session.readiness(), Readiness::Failed);
        assert_eq!(session.submit_options(), Err(SessionError::NotReady));
    }

    #[tokio::test]
    async fn test_wall_in_setup_is_ignored() {
        let mut session = controller();
        session.connect().await.unwrap();
        let wall = Wall::new(wallgo_rules::Orientation::H, Cell::new(0, 0));
        assert_eq!(session.place_wall(wall).await, Ok(Dispatch::Ignored));
        assert_eq!(session.cancel_selection(), Ok(Dispatch::Ignored));
    }

    #[tokio::test]
    async fn test_options_editable_until_first_token() {
        let mut session = controller();
        session.connect().await.unwrap();
        let three = SetupOptions::clamped(7, 3, 1);
        assert_eq!(session.change_options(three), Ok(Dispatch::Applied));
        assert_eq!(session.submit_options(), Ok(Dispatch::Applied));
        assert_eq!(session.change_options(three), Ok(Dispatch::Applied));
        assert_eq!(
            session.place_token(Cell::new(0, 0)).await,
            Ok(Dispatch::Applied)
        );
        assert_eq!(
            session.change_options(SetupOptions::clamped(7, 2, 2)),
            Ok(Dispatch::Ignored)
        );
    }
}
