//! Piece movement: up to two orthogonal steps that never cross a wall.

use std::collections::BTreeSet;

use crate::{Cell, GameState, Orientation, Wall};

/// Whether the step between adjacent cells `a` and `b` is walled off.
///
/// Steps between cells that are not orthogonal neighbours always count as blocked.
pub fn is_blocked(state: &GameState, a: Cell, b: Cell) -> bool {
    if a.row == b.row && a.col.abs_diff(b.col) == 1 {
        let west = a.col.min(b.col);
        state.wall_exists(Wall::new(Orientation::V, Cell::new(a.row, west)))
    } else if a.col == b.col && a.row.abs_diff(b.row) == 1 {
        let north = a.row.min(b.row);
        state.wall_exists(Wall::new(Orientation::H, Cell::new(north, a.col)))
    } else {
        true
    }
}

/// Whether the piece on `cell` may stay put this turn.
///
/// Staying is allowed while at least one edge of the cell is still open,
/// so a wall can follow.
pub fn can_pass_in_place(state: &GameState, cell: Cell) -> bool {
    state.occupant(cell) == Some(state.current_player())
        && cell
            .neighbours(state.board_size())
            .any(|n| !is_blocked(state, cell, n))
}

/// Whether `to` can be reached from `from` in one or two steps.
///
/// Intermediate cells must be empty; the starting cell may be revisited.
fn reachable(state: &GameState, from: Cell, to: Cell) -> bool {
    let size = state.board_size();
    let passable = |cell: Cell| cell == from || cell == to || state.occupant(cell).is_none();

    from.neighbours(size)
        .filter(|&first| passable(first) && !is_blocked(state, from, first))
        .any(|first| {
            first == to
                || first
                    .neighbours(size)
                    .filter(|&second| passable(second))
                    .any(|second| second == to && !is_blocked(state, first, second))
        })
}

/// Whether `path` is a legal move for the current player.
///
/// `[src]` stays in place; `[src, dst]` moves to `dst`.
pub fn is_legal_path(state: &GameState, path: &[Cell]) -> bool {
    let size = state.board_size();
    if path.iter().any(|cell| !cell.in_bounds(size)) {
        return false;
    }
    match *path {
        [src] => can_pass_in_place(state, src),
        [src, dst] => {
            state.occupant(src) == Some(state.current_player())
                && (dst == src || state.occupant(dst).is_none())
                && reachable(state, src, dst)
        }
        _ => false,
    }
}

/// All cells the piece on `cell` may finish on this turn.
///
/// Includes `cell` itself when staying in place is allowed.
pub fn legal_destinations(state: &GameState, cell: Cell) -> BTreeSet<Cell> {
    let size = state.board_size();
    let mut out = BTreeSet::new();
    if !cell.in_bounds(size) || state.occupant(cell) != Some(state.current_player()) {
        return out;
    }
    if can_pass_in_place(state, cell) {
        out.insert(cell);
    }
    let rows = cell.row.saturating_sub(2)..=(cell.row + 2).min(size - 1);
    for row in rows {
        let cols = cell.col.saturating_sub(2)..=(cell.col + 2).min(size - 1);
        for col in cols {
            let dst = Cell::new(row, col);
            if dst != cell && is_legal_path(state, &[cell, dst]) {
                out.insert(dst);
            }
        }
    }
    out
}
