//! Selectable-piece resolution: which of the active player's pieces can move.
//!
//! One legality query goes out per owned cell. The queries are independent, so
//! they run as a bounded concurrent batch; the batch only counts once every
//! query has answered. Each batch is stamped with the snapshot generation it
//! was built from, and the session discards batches from older generations.

use std::collections::BTreeSet;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, instrument};
use wallgo_rules::{Cell, PlayerId};

use crate::{EngineError, RulesEngine, Snapshot};

/// Legality queries to run for one snapshot generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableQuery {
    generation: u64,
    player: PlayerId,
    cells: Vec<Cell>,
}

impl SelectableQuery {
    /// Collects the cells owned by the snapshot's current player.
    #[instrument(skip(snapshot), fields(player = snapshot.current_player))]
    pub fn for_snapshot(snapshot: &Snapshot, generation: u64) -> Self {
        let player = snapshot.current_player;
        Self {
            generation,
            player,
            cells: snapshot.pieces_of(player),
        }
    }

    /// Generation the query was built for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cells that will be queried.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Runs every query, at most `max_concurrent` at a time.
    ///
    /// Any failed query fails the whole batch.
    #[instrument(skip(self, engine), fields(generation = self.generation, queries = self.cells.len()))]
    pub async fn run<E>(self, engine: &E, max_concurrent: usize) -> Result<SelectableBatch, EngineError>
    where
        E: RulesEngine + ?Sized,
    {
        let answers: Vec<(Cell, bool)> = stream::iter(self.cells.iter().copied())
            .map(|cell| async move {
                engine
                    .has_legal_move(cell)
                    .await
                    .map(|movable| (cell, movable))
            })
            .buffer_unordered(max_concurrent.max(1))
            .try_collect()
            .await?;

        let selectable: BTreeSet<Cell> = answers
            .into_iter()
            .filter_map(|(cell, movable)| movable.then_some(cell))
            .collect();
        debug!(
            selectable = selectable.len(),
            owned = self.cells.len(),
            "Selectable pieces resolved"
        );

        Ok(SelectableBatch {
            generation: self.generation,
            player: self.player,
            selectable,
        })
    }
}

/// Result of a complete legality batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableBatch {
    generation: u64,
    player: PlayerId,
    selectable: BTreeSet<Cell>,
}

impl SelectableBatch {
    /// Generation the batch was computed for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Player whose pieces were queried.
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Pieces with at least one legal move.
    pub fn selectable(&self) -> &BTreeSet<Cell> {
        &self.selectable
    }

    /// Consumes the batch, returning the selectable pieces.
    pub fn into_selectable(self) -> BTreeSet<Cell> {
        self.selectable
    }

    /// Whether the player is stuck: no piece can move.
    pub fn is_stuck(&self) -> bool {
        self.selectable.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalEngine;
    use wallgo_rules::empty_grid;

    async fn engine_with(pieces: &[(usize, usize, PlayerId)]) -> LocalEngine {
        let engine = LocalEngine::new();
        let mut board = empty_grid(7);
        for &(r, c, p) in pieces {
            board[r][c] = Some(p);
        }
        engine
            .commit_board_and_start_main(board, 0, 2, 2, 7)
            .await
            .unwrap();
        engine.start_main_phase().await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_queries_only_own_pieces() {
        let engine = engine_with(&[(0, 0, 0), (6, 6, 0), (3, 3, 1)]).await;
        let snap = engine.get_state().await.unwrap();
        let query = SelectableQuery::for_snapshot(&snap, 4);
        assert_eq!(query.cells(), &[Cell::new(0, 0), Cell::new(6, 6)]);

        let batch = query.run(&engine, 1).await.unwrap();
        assert_eq!(batch.generation(), 4);
        assert_eq!(batch.player(), 0);
        assert_eq!(batch.selectable().len(), 2);
        assert!(!batch.is_stuck());
    }

    #[tokio::test]
    async fn test_no_pieces_is_stuck() {
        let engine = engine_with(&[(3, 3, 1)]).await;
        let snap = engine.get_state().await.unwrap();
        let batch = SelectableQuery::for_snapshot(&snap, 1)
            .run(&engine, 8)
            .await
            .unwrap();
        assert!(batch.is_stuck());
    }

    #[tokio::test]
    async fn test_failed_query_fails_batch() {
        let engine = engine_with(&[(0, 0, 0)]).await;
        let snap = engine.get_state().await.unwrap();
        let broken = LocalEngine::unavailable();
        let result = SelectableQuery::for_snapshot(&snap, 1).run(&broken, 8).await;
        assert!(matches!(result, Err(EngineError::Unavailable(_))));
    }
}
