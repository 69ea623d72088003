//! Move-then-wall interaction protocol.
//!
//! During a main-phase turn exactly one interaction is pending:
//!
//! - [`Interaction::NoSelection`]: pick one of your movable pieces.
//! - [`Interaction::PieceSelected`]: pick where it goes (itself to stay put), or cancel.
//! - [`Interaction::WallPending`]: seal one open edge of the cell you moved to.
//!
//! The functions here only decide whether an input fits the pending interaction
//! and what to send to the engine. Anything that does not fit yields `None`,
//! and the caller drops the input without contacting the engine.

use std::collections::BTreeSet;

use tracing::{debug, instrument};
use wallgo_rules::{Cell, Wall};

use crate::Snapshot;

/// Short name of an interaction, for logs and prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum InteractionKind {
    /// Waiting for a piece to be selected.
    #[strum(serialize = "select a piece")]
    NoSelection,
    /// Waiting for a destination.
    #[strum(serialize = "move to a square")]
    PieceSelected,
    /// Waiting for a wall.
    #[strum(serialize = "place a wall")]
    WallPending,
}

/// The single pending interaction of a main-phase turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Nothing selected yet.
    NoSelection,
    /// A piece is selected and awaits its destination.
    PieceSelected {
        /// The selected piece.
        source: Cell,
        /// Legal destinations, once the engine has reported them.
        ///
        /// `None` means they still have to be fetched for the current snapshot.
        destinations: Option<BTreeSet<Cell>>,
    },
    /// The move is done; a wall is owed.
    WallPending {
        /// Cell the moved piece ended on.
        last_moved: Cell,
        /// Open edges around `last_moved`.
        candidates: Vec<Wall>,
    },
}

impl Interaction {
    /// Short name of this interaction.
    pub fn kind(&self) -> InteractionKind {
        match self {
            Self::NoSelection => InteractionKind::NoSelection,
            Self::PieceSelected { .. } => InteractionKind::PieceSelected,
            Self::WallPending { .. } => InteractionKind::WallPending,
        }
    }

    /// Derives the interaction a fresh main-phase snapshot calls for.
    ///
    /// A wall owed by the engine always wins. A local selection survives only
    /// while it still names a piece of the player to act; its destinations are
    /// dropped whenever the board or walls changed, since they may be stale.
    #[instrument(skip(previous, previous_snapshot, snapshot))]
    pub fn reconcile(
        previous: &Interaction,
        previous_snapshot: Option<&Snapshot>,
        snapshot: &Snapshot,
    ) -> Interaction {
        if snapshot.wall_pending
            && let Some(last_moved) = snapshot.last_moved()
        {
            return Self::WallPending {
                last_moved,
                candidates: snapshot.open_edges(last_moved),
            };
        }

        match previous {
            Self::PieceSelected {
                source,
                destinations,
            } if snapshot.occupant(*source) == Some(snapshot.current_player) => {
                let unchanged = previous_snapshot.is_some_and(|prev| {
                    prev.board == snapshot.board
                        && prev.walls_h == snapshot.walls_h
                        && prev.walls_v == snapshot.walls_v
                        && prev.current_player == snapshot.current_player
                        && !prev.wall_pending
                });
                Self::PieceSelected {
                    source: *source,
                    destinations: if unchanged { destinations.clone() } else { None },
                }
            }
            _ => Self::NoSelection,
        }
    }

    /// Selecting `cell` from `selectable` while nothing is selected.
    #[instrument(skip(self, selectable))]
    pub fn select(&self, cell: Cell, selectable: &BTreeSet<Cell>) -> Option<Interaction> {
        match self {
            Self::NoSelection if selectable.contains(&cell) => Some(Self::PieceSelected {
                source: cell,
                destinations: None,
            }),
            _ => {
                debug!(kind = %self.kind(), %cell, "Selection does not fit");
                None
            }
        }
    }

    /// Dropping the current selection, without any engine call.
    #[instrument(skip(self))]
    pub fn cancel(&self) -> Option<Interaction> {
        match self {
            Self::PieceSelected { .. } => Some(Self::NoSelection),
            _ => None,
        }
    }

    /// The move path for choosing `destination`.
    ///
    /// Choosing the selected cell itself stays in place (`[source]`); any other
    /// legal destination moves there (`[source, destination]`).
    #[instrument(skip(self))]
    pub fn move_path(&self, destination: Cell) -> Option<Vec<Cell>> {
        match self {
            Self::PieceSelected {
                source,
                destinations: Some(legal),
            } if legal.contains(&destination) => {
                if destination == *source {
                    Some(vec![*source])
                } else {
                    Some(vec![*source, destination])
                }
            }
            _ => {
                debug!(kind = %self.kind(), %destination, "Destination does not fit");
                None
            }
        }
    }

    /// Whether `wall` is one of the open edges owed right now.
    #[instrument(skip(self))]
    pub fn accepts_wall(&self, wall: Wall) -> bool {
        matches!(self, Self::WallPending { candidates, .. } if candidates.contains(&wall))
    }

    /// The selected piece, if any.
    pub fn source(&self) -> Option<Cell> {
        match self {
            Self::PieceSelected { source, .. } => Some(*source),
            _ => None,
        }
    }

    /// Known legal destinations of the selected piece.
    pub fn destinations(&self) -> Option<&BTreeSet<Cell>> {
        match self {
            Self::PieceSelected { destinations, .. } => destinations.as_ref(),
            _ => None,
        }
    }

    /// Cell the last move ended on, while a wall is owed.
    pub fn last_moved(&self) -> Option<Cell> {
        match self {
            Self::WallPending { last_moved, .. } => Some(*last_moved),
            _ => None,
        }
    }

    /// Open edges that may take the owed wall.
    pub fn wall_candidates(&self) -> &[Wall] {
        match self {
            Self::WallPending { candidates, .. } => candidates,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallgo_rules::{GameState, Orientation, Phase, PlacedWall};

    fn main_snapshot() -> Snapshot {
        let mut snap = Snapshot::from(&GameState::new());
        snap.phase = Phase::Main;
        snap.board[2][3] = Some(0);
        snap.board[5][5] = Some(1);
        snap
    }

    fn selected(destinations: &[Cell]) -> Interaction {
        Interaction::PieceSelected {
            source: Cell::new(2, 3),
            destinations: Some(destinations.iter().copied().collect()),
        }
    }

    #[test]
    fn test_select_requires_selectable_piece() {
        let selectable = BTreeSet::from([Cell::new(2, 3)]);
        let s0 = Interaction::NoSelection;
        assert!(s0.select(Cell::new(5, 5), &selectable).is_none());
        let s1 = s0.select(Cell::new(2, 3), &selectable).unwrap();
        assert_eq!(s1.source(), Some(Cell::new(2, 3)));
        assert!(s1.select(Cell::new(2, 3), &selectable).is_none());
    }

    #[test]
    fn test_same_cell_is_pass_in_place() {
        let s1 = selected(&[Cell::new(2, 3), Cell::new(2, 4)]);
        assert_eq!(s1.move_path(Cell::new(2, 3)), Some(vec![Cell::new(2, 3)]));
        assert_eq!(
            s1.move_path(Cell::new(2, 4)),
            Some(vec![Cell::new(2, 3), Cell::new(2, 4)])
        );
        assert_eq!(s1.move_path(Cell::new(0, 0)), None);
    }

    #[test]
    fn test_destination_needs_loaded_set() {
        let s1 = Interaction::PieceSelected {
            source: Cell::new(2, 3),
            destinations: None,
        };
        assert_eq!(s1.move_path(Cell::new(2, 3)), None);
    }

    #[test]
    fn test_cancel_only_from_selection() {
        assert_eq!(selected(&[]).cancel(), Some(Interaction::NoSelection));
        assert_eq!(Interaction::NoSelection.cancel(), None);
    }

    #[test]
    fn test_wall_only_while_pending() {
        let wall = Wall::new(Orientation::H, Cell::new(2, 3));
        assert!(!Interaction::NoSelection.accepts_wall(wall));
        let s2 = Interaction::WallPending {
            last_moved: Cell::new(2, 3),
            candidates: vec![wall],
        };
        assert!(s2.accepts_wall(wall));
        assert!(!s2.accepts_wall(Wall::new(Orientation::V, Cell::new(0, 0))));
    }

    #[test]
    fn test_reconcile_wall_pending_wins() {
        let mut snap = main_snapshot();
        snap.walls_h.insert(PlacedWall::new(Cell::new(2, 3), 1));
        snap.move_path = vec![Cell::new(2, 3)];
        snap.wall_pending = true;
        let next = Interaction::reconcile(&selected(&[]), None, &snap);
        assert_eq!(next.last_moved(), Some(Cell::new(2, 3)));
        assert_eq!(next.wall_candidates().len(), 3);
    }

    #[test]
    fn test_reconcile_keeps_selection_and_drops_stale_destinations() {
        let before = main_snapshot();
        let s1 = selected(&[Cell::new(2, 4)]);

        let same = Interaction::reconcile(&s1, Some(&before), &before);
        assert_eq!(same, s1);

        let mut after = before.clone();
        after.walls_v.insert(PlacedWall::new(Cell::new(2, 3), 1));
        let changed = Interaction::reconcile(&s1, Some(&before), &after);
        assert_eq!(changed.source(), Some(Cell::new(2, 3)));
        assert_eq!(changed.destinations(), None);
    }

    #[test]
    fn test_reconcile_drops_selection_of_other_player() {
        let mut snap = main_snapshot();
        snap.current_player = 1;
        let next = Interaction::reconcile(&selected(&[]), None, &snap);
        assert_eq!(next, Interaction::NoSelection);
    }
}
