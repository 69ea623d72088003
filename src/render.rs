//! Plain-text board rendering for the console.

use wallgo_rules::{Cell, Orientation, Wall};

use crate::{SessionState, Stage};

/// Draws the board the session currently shows, with a status line.
///
/// Pieces are player digits, `|` is a wall on a cell's east edge and `-` one
/// on its south edge. Selectable pieces are bracketed; `*` marks the cell
/// the last move ended on.
pub fn render(state: &SessionState) -> String {
    let mut out = status(state);
    out.push('\n');

    let Some(board) = state.board() else {
        return out;
    };
    let snapshot = match state.stage() {
        Stage::Placement(_) => None,
        _ => state.snapshot().as_ref(),
    };
    let has_wall = |wall: Wall| snapshot.is_some_and(|snap| snap.has_wall(wall));
    let last_moved = snapshot.and_then(|snap| snap.last_moved());
    let size = board.len();

    out.push_str("   ");
    for col in 0..size {
        out.push_str(&format!("{col:>2}  "));
    }
    out.push('\n');

    for (row, cells) in board.iter().enumerate() {
        out.push_str(&format!("{row:>2} "));
        for (col, occupant) in cells.iter().enumerate() {
            let cell = Cell::new(row, col);
            let glyph = occupant.map_or_else(|| ".".to_string(), |p| p.to_string());
            let (open, close) = if state.selectable_is_current() && state.selectable().contains(&cell)
            {
                ('[', ']')
            } else if last_moved == Some(cell) {
                ('*', ' ')
            } else {
                (' ', ' ')
            };
            out.push(open);
            out.push_str(&glyph);
            out.push(close);
            if col + 1 < size {
                out.push(if has_wall(Wall::new(Orientation::V, cell)) {
                    '|'
                } else {
                    ' '
                });
            }
        }
        out.push('\n');
        if row + 1 < size {
            out.push_str("   ");
            for col in 0..size {
                let south = Wall::new(Orientation::H, Cell::new(row, col));
                out.push_str(if has_wall(south) { "--- " } else { "    " });
            }
            out.push('\n');
        }
    }
    out
}

fn status(state: &SessionState) -> String {
    match state.stage() {
        Stage::Options(options) => format!(
            "Setup: {0}x{0} board, {1} players, {2} pieces each",
            options.board_size(),
            options.num_players(),
            options.pieces_per_player()
        ),
        Stage::Placement(alloc) => format!(
            "Placement: player {} places ({} tokens left, {})",
            alloc.turn(),
            alloc.remaining(),
            alloc.direction()
        ),
        Stage::Main(interaction) => format!(
            "Player {} to {}",
            state.acting_player().unwrap_or_default(),
            interaction.kind()
        ),
        Stage::GameOver { winner, scores } => match scores {
            Some(scores) => format!("Game over: player {winner} wins, scores {scores:?}"),
            None => format!("Game over: player {winner} wins"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SetupAllocator, SetupOptions, Snapshot};
    use wallgo_rules::GameState;

    #[test]
    fn test_placement_board_shows_tokens() {
        let mut state = SessionState::new(SetupOptions::clamped(5, 2, 1));
        let mut alloc = SetupAllocator::new(SetupOptions::clamped(5, 2, 1));
        alloc.place_token(Cell::new(1, 2)).unwrap();
        state.set_stage(Stage::Placement(alloc));

        let text = render(&state);
        assert!(text.starts_with("Placement: player 1 places"));
        let row_one = text.lines().find(|line| line.starts_with(" 1 ")).unwrap();
        assert!(row_one.contains('0'));
    }

    #[test]
    fn test_options_have_no_board() {
        let state = SessionState::new(SetupOptions::clamped(7, 3, 2));
        assert_eq!(render(&state).lines().count(), 1);
    }

    #[test]
    fn test_options_hide_engine_board_after_reset() {
        let mut state = SessionState::new(SetupOptions::clamped(7, 2, 2));
        let mut snap = Snapshot::from(&GameState::new());
        snap.board[3][3] = Some(0);
        state.reconcile(snap);

        assert!(matches!(state.stage(), Stage::Options(_)));
        assert_eq!(state.board(), None);
        assert_eq!(render(&state).lines().count(), 1);
    }
}
