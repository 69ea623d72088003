//! Session configuration.

use std::path::Path;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use wallgo_rules::{DEFAULT_BOARD_SIZE, DEFAULT_PIECES_PER_PLAYER, DEFAULT_PLAYERS};

use crate::SetupOptions;

/// Configuration for a session controller.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Board side offered on the setup form.
    #[serde(default = "default_board_size")]
    board_size: usize,

    /// Player count offered on the setup form.
    #[serde(default = "default_num_players")]
    num_players: usize,

    /// Pieces per player offered on the setup form.
    #[serde(default = "default_pieces_per_player")]
    pieces_per_player: usize,

    /// Most legality queries in flight at once while resolving selectable pieces.
    #[serde(default = "default_max_concurrent_queries")]
    max_concurrent_queries: usize,
}

#[instrument]
fn default_board_size() -> usize {
    DEFAULT_BOARD_SIZE
}

#[instrument]
fn default_num_players() -> usize {
    DEFAULT_PLAYERS
}

#[instrument]
fn default_pieces_per_player() -> usize {
    DEFAULT_PIECES_PER_PLAYER
}

#[instrument]
fn default_max_concurrent_queries() -> usize {
    8
}

impl SessionConfig {
    /// Creates a configuration with the default options.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board_size: default_board_size(),
            num_players: default_num_players(),
            pieces_per_player: default_pieces_per_player(),
            max_concurrent_queries: default_max_concurrent_queries(),
        }
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        if config.max_concurrent_queries == 0 {
            return Err(ConfigError::new(
                "max_concurrent_queries must be at least 1".to_string(),
            ));
        }

        info!(
            board_size = config.board_size,
            num_players = config.num_players,
            pieces_per_player = config.pieces_per_player,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Overrides the setup form values; `None` keeps the current value.
    #[instrument(skip(self))]
    pub fn with_overrides(
        mut self,
        board_size: Option<usize>,
        num_players: Option<usize>,
        pieces_per_player: Option<usize>,
    ) -> Self {
        if let Some(size) = board_size {
            self.board_size = size;
        }
        if let Some(players) = num_players {
            self.num_players = players;
        }
        if let Some(pieces) = pieces_per_player {
            self.pieces_per_player = pieces;
        }
        self
    }

    /// Setup options seeded from this configuration, clamped into range.
    #[instrument(skip(self))]
    pub fn setup_options(&self) -> SetupOptions {
        SetupOptions::clamped(self.board_size, self.num_players, self.pieces_per_player)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
