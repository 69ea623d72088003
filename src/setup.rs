//! Setup phase: the option form and the snake-draft token allocator.
//!
//! Placement happens entirely on the client. The engine only sees the finished
//! board, once, when the allocator reports completion.

use derive_getters::Getters;
use derive_new::new;
use tracing::{debug, info, instrument};
use wallgo_rules::{
    Cell, DEFAULT_BOARD_SIZE, Grid, MAX_BOARD_SIZE, MAX_PLAYERS, MIN_BOARD_SIZE, MIN_PLAYERS,
    PlayerId, empty_grid,
};

/// Board and player parameters chosen before placement begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct SetupOptions {
    board_size: usize,
    num_players: usize,
    pieces_per_player: usize,
}

impl SetupOptions {
    /// Builds options, clamping each value into its supported range.
    ///
    /// Pieces per player are capped at the board side.
    #[instrument]
    pub fn clamped(board_size: usize, num_players: usize, pieces_per_player: usize) -> Self {
        let board_size = board_size.clamp(MIN_BOARD_SIZE, MAX_BOARD_SIZE);
        Self {
            board_size,
            num_players: num_players.clamp(MIN_PLAYERS, MAX_PLAYERS),
            pieces_per_player: pieces_per_player.clamp(1, board_size),
        }
    }

    /// Builds options from raw form text; unparsable numbers fall back.
    ///
    /// A blank or garbled board size means the default side, garbled piece
    /// counts mean a single piece.
    #[instrument]
    pub fn from_form(board_size: &str, num_players: usize, pieces_per_player: &str) -> Self {
        let size = board_size.trim().parse().unwrap_or(DEFAULT_BOARD_SIZE);
        let pieces = pieces_per_player.trim().parse().unwrap_or(1);
        Self::clamped(size, num_players, pieces)
    }
}

/// Direction the snake draft is currently stepping in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Direction {
    /// Towards higher player indices.
    Forward,
    /// Towards lower player indices.
    Backward,
}

/// Board handed to the engine when placement finishes.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct SetupCompletion {
    /// The locally built board.
    pub board: Grid,
    /// Who takes the first main-phase turn.
    pub starting_player: PlayerId,
    /// Options the board was built with.
    pub options: SetupOptions,
}

/// Snake-draft allocator for setup placement.
///
/// The placing player steps in the current direction; stepping past either end
/// clamps to that end and reverses, so the end players place twice in a row.
/// Players without tokens left are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct SetupAllocator {
    options: SetupOptions,
    board: Grid,
    tokens: Vec<usize>,
    turn: PlayerId,
    direction: Direction,
    placed: usize,
    #[getter(skip)]
    completion_taken: bool,
}

impl SetupAllocator {
    /// Creates an allocator with every player's full token quota.
    #[instrument]
    pub fn new(options: SetupOptions) -> Self {
        info!(
            num_players = options.num_players,
            pieces = options.pieces_per_player,
            "Starting setup placement"
        );
        Self {
            options,
            board: empty_grid(options.board_size),
            tokens: vec![options.pieces_per_player; options.num_players],
            turn: 0,
            direction: Direction::Forward,
            placed: 0,
            completion_taken: false,
        }
    }

    /// Replaces the options, reseeding everything.
    ///
    /// Only allowed before the first token is placed; returns whether it applied.
    #[instrument(skip(self))]
    pub fn reconfigure(&mut self, options: SetupOptions) -> bool {
        if self.placed > 0 {
            debug!(placed = self.placed, "Tokens already placed, keeping options");
            return false;
        }
        *self = Self::new(options);
        true
    }

    /// Tokens still to place across all players.
    pub fn remaining(&self) -> usize {
        self.tokens.iter().sum()
    }

    /// Whether every token has been placed.
    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether the placing player may put a token on `cell`.
    pub fn can_place(&self, cell: Cell) -> bool {
        cell.in_bounds(self.options.board_size)
            && self.board[cell.row][cell.col].is_none()
            && self.tokens.get(self.turn).is_some_and(|&t| t > 0)
    }

    /// Places a token for the player whose turn it is.
    ///
    /// Returns the player who placed it, or `None` if the placement was not allowed.
    #[instrument(skip(self), fields(turn = self.turn))]
    pub fn place_token(&mut self, cell: Cell) -> Option<PlayerId> {
        if !self.can_place(cell) {
            debug!(%cell, "Placement ignored");
            return None;
        }
        let player = self.turn;
        self.board[cell.row][cell.col] = Some(player);
        self.tokens[player] -= 1;
        self.placed += 1;
        debug!(player, %cell, left = self.tokens[player], "Token placed");
        self.advance();
        Some(player)
    }

    /// Steps to the next player with tokens left.
    ///
    /// Turn and direction stay untouched once nobody has tokens.
    fn advance(&mut self) {
        if self.is_complete() {
            return;
        }
        let last = self.options.num_players - 1;
        let mut next = self.turn;
        let mut direction = self.direction;
        // Two sweeps visit every player at least once.
        for _ in 0..2 * self.options.num_players {
            match direction {
                Direction::Forward if next >= last => {
                    next = last;
                    direction = Direction::Backward;
                }
                Direction::Forward => next += 1,
                Direction::Backward if next == 0 => direction = Direction::Forward,
                Direction::Backward => next -= 1,
            }
            if self.tokens[next] > 0 {
                self.turn = next;
                self.direction = direction;
                return;
            }
        }
    }

    /// First main-phase player: player 0 after a forward sweep, otherwise the last player.
    pub fn starting_player(&self) -> PlayerId {
        match self.direction {
            Direction::Forward => 0,
            Direction::Backward => self.options.num_players - 1,
        }
    }

    /// Hands out the finished board exactly once.
    #[instrument(skip(self))]
    pub fn take_completion(&mut self) -> Option<SetupCompletion> {
        if !self.is_complete() || self.completion_taken {
            return None;
        }
        self.completion_taken = true;
        let starting_player = self.starting_player();
        info!(starting_player, direction = %self.direction, "Setup placement complete");
        Some(SetupCompletion::new(
            self.board.clone(),
            starting_player,
            self.options,
        ))
    }
}
