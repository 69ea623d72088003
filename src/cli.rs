//! Command-line interface for wallgo.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Wallgo - move, then wall; the last one sharing ground loses it
#[derive(Parser, Debug)]
#[command(name = "wallgo")]
#[command(about = "Play wall-go in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play at the terminal, optionally against bots
    Play {
        /// Game options
        #[command(flatten)]
        game: GameArgs,

        /// Seats played by bots, comma separated (e.g. "1,2")
        #[arg(long, value_delimiter = ',')]
        bots: Vec<usize>,
    },

    /// Let bots play every seat and print the result
    Auto {
        /// Game options
        #[command(flatten)]
        game: GameArgs,

        /// Pause between bot actions, in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,

        /// Print only the outcome, as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GameArgs {
    /// Path to a TOML session config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Board side (5-15)
    #[arg(long)]
    pub board_size: Option<usize>,

    /// Number of players (2-4)
    #[arg(long)]
    pub players: Option<usize>,

    /// Pieces per player
    #[arg(long)]
    pub pieces: Option<usize>,
}
