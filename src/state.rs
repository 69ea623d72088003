//! Session state and snapshot reconciliation.
//!
//! The stage is one tagged value, so combinations such as "piece selected
//! while a wall is owed" cannot be represented. Snapshots enter only through
//! [`SessionState::reconcile`], which is total and idempotent.

use std::collections::BTreeSet;

use derive_getters::Getters;
use tracing::{debug, info, instrument};
use wallgo_rules::{Cell, Grid, Phase, PlayerId};

use crate::{Interaction, SetupAllocator, SetupOptions, Snapshot};

/// Where the session currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Choosing board size, player count and pieces per player.
    Options(SetupOptions),
    /// Placing pieces by snake draft, before the engine is involved.
    Placement(SetupAllocator),
    /// Move-then-wall turns.
    Main(Interaction),
    /// Somebody won; nothing moves any more.
    GameOver {
        /// The winner reported by the engine.
        winner: PlayerId,
        /// Final territory, once fetched.
        scores: Option<Vec<usize>>,
    },
}

impl Stage {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Options(_) => "options",
            Self::Placement(_) => "placement",
            Self::Main(_) => "main",
            Self::GameOver { .. } => "game over",
        }
    }
}

/// State owned by one session controller.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct SessionState {
    /// Last snapshot absorbed from the engine.
    snapshot: Option<Snapshot>,
    /// Bumped every time an absorbed snapshot differs from the previous one.
    generation: u64,
    /// Current stage.
    stage: Stage,
    /// Active player's pieces that can move, for the current generation.
    selectable: BTreeSet<Cell>,
    /// Generation `selectable` was resolved for.
    selectable_generation: Option<u64>,
}

impl SessionState {
    /// Creates a session waiting on the setup form.
    #[instrument]
    pub fn new(options: SetupOptions) -> Self {
        Self {
            snapshot: None,
            generation: 0,
            stage: Stage::Options(options),
            selectable: BTreeSet::new(),
            selectable_generation: None,
        }
    }

    /// Absorbs an engine snapshot.
    ///
    /// Overwrites everything derived from the engine and recomputes the stage.
    /// Absorbing the snapshot already held changes nothing. Returns whether
    /// anything changed.
    #[instrument(skip(self, snapshot), fields(generation = self.generation))]
    pub fn reconcile(&mut self, snapshot: Snapshot) -> bool {
        if self.snapshot.as_ref() == Some(&snapshot) {
            debug!("Snapshot unchanged");
            return false;
        }

        let previous = std::mem::replace(&mut self.stage, Stage::Main(Interaction::NoSelection));
        self.stage = match (snapshot.phase, snapshot.winner) {
            (Phase::Setup, _) => match previous {
                Stage::Options(_) | Stage::Placement(_) => previous,
                _ => Stage::Options(SetupOptions::clamped(
                    snapshot.board_size,
                    snapshot.num_players,
                    snapshot.pieces_per_player,
                )),
            },
            (Phase::Main, Some(winner)) => match previous {
                Stage::GameOver { winner: w, scores } if w == winner => {
                    Stage::GameOver { winner, scores }
                }
                _ => {
                    info!(winner, "Game over");
                    Stage::GameOver {
                        winner,
                        scores: None,
                    }
                }
            },
            (Phase::Main, None) => {
                let interaction = match &previous {
                    Stage::Main(interaction) => interaction,
                    _ => &Interaction::NoSelection,
                };
                Stage::Main(Interaction::reconcile(
                    interaction,
                    self.snapshot.as_ref(),
                    &snapshot,
                ))
            }
        };

        self.generation += 1;
        self.selectable.clear();
        self.selectable_generation = None;
        self.snapshot = Some(snapshot);
        debug!(
            generation = self.generation,
            stage = self.stage.label(),
            "Snapshot absorbed"
        );
        true
    }

    /// Replaces the stage after a validated local action.
    pub(crate) fn set_stage(&mut self, stage: Stage) {
        debug!(from = self.stage.label(), to = stage.label(), "Stage change");
        self.stage = stage;
    }

    /// Mutable access to the stage for in-place local actions.
    pub(crate) fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Stores resolved selectable pieces, unless they belong to an older generation.
    ///
    /// A selection whose piece is no longer selectable is dropped.
    #[instrument(skip(self, selectable))]
    pub(crate) fn apply_selectable(&mut self, generation: u64, selectable: BTreeSet<Cell>) -> bool {
        if generation != self.generation {
            debug!(current = self.generation, "Discarding stale selectable batch");
            return false;
        }
        if let Stage::Main(Interaction::PieceSelected { source, .. }) = &self.stage
            && !selectable.contains(source)
        {
            debug!(%source, "Selected piece can no longer move");
            self.stage = Stage::Main(Interaction::NoSelection);
        }
        self.selectable = selectable;
        self.selectable_generation = Some(generation);
        true
    }

    /// Stores destinations for the selected piece, unless they are stale.
    #[instrument(skip(self, destinations))]
    pub(crate) fn apply_destinations(
        &mut self,
        generation: u64,
        source: Cell,
        destinations: BTreeSet<Cell>,
    ) -> bool {
        if generation != self.generation {
            debug!(current = self.generation, "Discarding stale destinations");
            return false;
        }
        match &mut self.stage {
            Stage::Main(Interaction::PieceSelected {
                source: selected,
                destinations: slot,
            }) if *selected == source => {
                *slot = Some(destinations);
                true
            }
            _ => false,
        }
    }

    /// Stores final scores while the game is over.
    pub(crate) fn apply_scores(&mut self, final_scores: Vec<usize>) {
        if let Stage::GameOver { scores, .. } = &mut self.stage {
            *scores = Some(final_scores);
        }
    }

    /// Whether `selectable` reflects the current generation.
    pub fn selectable_is_current(&self) -> bool {
        self.selectable_generation == Some(self.generation)
    }

    /// The active interaction, while in the main phase.
    pub fn interaction(&self) -> Option<&Interaction> {
        match &self.stage {
            Stage::Main(interaction) => Some(interaction),
            _ => None,
        }
    }

    /// Board to show: none on the setup form, the local draft board during
    /// placement, otherwise the engine's.
    pub fn board(&self) -> Option<&Grid> {
        match &self.stage {
            Stage::Options(_) => None,
            Stage::Placement(alloc) => Some(alloc.board()),
            Stage::Main(_) | Stage::GameOver { .. } => self.snapshot.as_ref().map(|snap| &snap.board),
        }
    }

    /// Player expected to act: the drafting player during placement, the engine's otherwise.
    pub fn acting_player(&self) -> Option<PlayerId> {
        match &self.stage {
            Stage::Options(_) | Stage::GameOver { .. } => None,
            Stage::Placement(alloc) => Some(*alloc.turn()),
            Stage::Main(_) => self.snapshot.as_ref().map(|snap| snap.current_player),
        }
    }

    /// Cell the last move ended on, from the tail of the engine's move path.
    pub fn last_moved(&self) -> Option<Cell> {
        self.snapshot.as_ref().and_then(Snapshot::last_moved)
    }

    /// Legal destinations of the selected piece, if loaded.
    pub fn valid_moves(&self) -> Option<&BTreeSet<Cell>> {
        self.interaction().and_then(Interaction::destinations)
    }

    /// Whether the engine says a wall is owed.
    pub fn wall_pending(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|snap| snap.wall_pending)
    }

    /// Winner, once the game is over.
    pub fn winner(&self) -> Option<PlayerId> {
        match &self.stage {
            Stage::GameOver { winner, .. } => Some(*winner),
            _ => None,
        }
    }

    /// Final territory, once fetched.
    pub fn scores(&self) -> Option<&[usize]> {
        match &self.stage {
            Stage::GameOver {
                scores: Some(scores),
                ..
            } => Some(scores),
            _ => None,
        }
    }
}
