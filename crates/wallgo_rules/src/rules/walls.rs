//! Wall placement: one wall per turn, on an open edge of the moved piece.

use crate::{Cell, GameState, Wall};

/// Open interior edges touching `cell`, in north, south, west, east order.
pub fn wall_candidates(state: &GameState, cell: Cell) -> Vec<Wall> {
    Wall::around(cell, state.board_size())
        .filter(|&wall| !state.wall_exists(wall))
        .collect()
}

/// Whether `wall` may be placed after the pending move.
pub fn is_legal_wall(state: &GameState, wall: Wall) -> bool {
    match state.move_path().last() {
        Some(&last) => wall_candidates(state, last).contains(&wall),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Orientation, PlacedWall};

    #[test]
    fn test_candidates_drop_existing_walls() {
        let mut state = GameState::new();
        state.walls_h.push(PlacedWall::new(Cell::new(2, 3), 0));
        let walls = wall_candidates(&state, Cell::new(3, 3));
        assert_eq!(walls.len(), 3);
        assert!(!walls.contains(&Wall::new(Orientation::H, Cell::new(2, 3))));
    }

    #[test]
    fn test_wall_must_touch_last_moved_cell() {
        let mut state = GameState::new();
        state.move_path = vec![Cell::new(3, 3)];
        assert!(is_legal_wall(&state, Wall::new(Orientation::V, Cell::new(3, 2))));
        assert!(!is_legal_wall(&state, Wall::new(Orientation::V, Cell::new(3, 4))));
    }

    #[test]
    fn test_no_wall_without_move() {
        let state = GameState::new();
        assert!(!is_legal_wall(&state, Wall::new(Orientation::H, Cell::new(0, 0))));
    }
}
