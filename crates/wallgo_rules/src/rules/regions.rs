//! Wall-bounded regions and territory scoring.

use std::collections::{BTreeSet, VecDeque};

use crate::{Cell, GameState, PlayerId};

use super::is_blocked;

/// A maximal set of cells connected through unwalled edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Cells in the region.
    pub cells: Vec<Cell>,
    /// Players with at least one piece inside.
    pub players: BTreeSet<PlayerId>,
}

impl Region {
    /// The single player holding this region, if exactly one does.
    pub fn owner(&self) -> Option<PlayerId> {
        match self.players.len() {
            1 => self.players.first().copied(),
            _ => None,
        }
    }
}

/// Partitions the board into regions by flood fill.
pub fn regions(state: &GameState) -> Vec<Region> {
    let size = state.board_size();
    let mut visited = vec![vec![false; size]; size];
    let mut out = Vec::new();

    for row in 0..size {
        for col in 0..size {
            if visited[row][col] {
                continue;
            }
            visited[row][col] = true;
            let mut queue = VecDeque::from([Cell::new(row, col)]);
            let mut region = Region {
                cells: Vec::new(),
                players: BTreeSet::new(),
            };

            while let Some(cell) = queue.pop_front() {
                region.cells.push(cell);
                if let Some(player) = state.occupant(cell) {
                    region.players.insert(player);
                }
                for next in cell.neighbours(size) {
                    if visited[next.row][next.col] || is_blocked(state, cell, next) {
                        continue;
                    }
                    visited[next.row][next.col] = true;
                    queue.push_back(next);
                }
            }
            out.push(region);
        }
    }
    out
}

/// Territory per player: the size of every region only they occupy.
pub fn region_scores(state: &GameState) -> Vec<usize> {
    let mut scores = vec![0; state.num_players()];
    for region in regions(state) {
        if let Some(owner) = region.owner()
            && let Some(score) = scores.get_mut(owner)
        {
            *score += region.cells.len();
        }
    }
    scores
}

/// Whether no region is shared between players.
pub fn all_isolated(state: &GameState) -> bool {
    regions(state).iter().all(|region| region.players.len() <= 1)
}

/// Player with the highest score; ties go to the lowest index.
pub fn leader(scores: &[usize]) -> Option<PlayerId> {
    scores
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
        .map(|(player, _)| player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlacedWall;

    #[test]
    fn test_open_board_is_one_region() {
        let mut state = GameState::new();
        state.board[0][0] = Some(0);
        state.board[6][6] = Some(1);
        assert_eq!(regions(&state).len(), 1);
        assert!(!all_isolated(&state));
        assert_eq!(region_scores(&state), vec![0, 0]);
    }

    #[test]
    fn test_walled_corner_scores_for_owner() {
        let mut state = GameState::new();
        state.board[0][0] = Some(1);
        state.board[6][6] = Some(0);
        state.walls_h.push(PlacedWall::new(Cell::new(0, 0), 1));
        state.walls_v.push(PlacedWall::new(Cell::new(0, 0), 1));
        assert_eq!(regions(&state).len(), 2);
        assert!(all_isolated(&state));
        assert_eq!(region_scores(&state), vec![48, 1]);
    }

    #[test]
    fn test_leader_breaks_ties_low() {
        assert_eq!(leader(&[3, 5, 5]), Some(1));
        assert_eq!(leader(&[4, 4]), Some(0));
        assert_eq!(leader(&[]), None);
    }
}
