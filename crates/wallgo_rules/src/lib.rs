//! Pure wall-go rules.
//!
//! Players take turns moving one of their pieces up to two orthogonal steps
//! and then sealing a wall on an edge of the cell they ended on. The game is
//! over once no wall-bounded region is shared between players; each player
//! then scores the cells of every region only they occupy.
//!
//! # Example
//!
//! ```
//! use wallgo_rules::{Cell, Game, Orientation, Wall, empty_grid};
//!
//! let mut board = empty_grid(7);
//! board[3][3] = Some(0);
//! board[5][5] = Some(1);
//!
//! let mut game = Game::new();
//! game.commit_board(board, 0, 2, 1, 7).unwrap();
//! game.start_main_phase();
//! game.move_piece(&[Cell::new(3, 3), Cell::new(3, 4)]).unwrap();
//! game.place_wall(Wall::new(Orientation::H, Cell::new(3, 4))).unwrap();
//! assert_eq!(game.state().current_player(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod game;
pub mod rules;
mod state;
mod types;

pub use action::RuleError;
pub use game::Game;
pub use state::GameState;
pub use types::{
    Cell, DEFAULT_BOARD_SIZE, DEFAULT_PIECES_PER_PLAYER, DEFAULT_PLAYERS, Grid, MAX_BOARD_SIZE,
    MAX_PLAYERS, MIN_BOARD_SIZE, MIN_PLAYERS, Orientation, Phase, PlacedWall, PlayerId, Wall,
    empty_grid,
};
