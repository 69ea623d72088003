//! Wallgo - terminal front end
//!
//! Runs a wall-go session against the in-process rules engine.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, GameArgs};
use tokio::sync::mpsc;
use tracing::{info, instrument};
use wallgo::players::{ConsolePlayer, FirstLegalPlayer, Player};
use wallgo::{GameEvent, LocalEngine, Orchestrator, Outcome, SessionConfig, SessionController};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing();

    match cli.command {
        Command::Play { game, bots } => run_play(game, bots).await,
        Command::Auto {
            game,
            delay_ms,
            json,
        } => run_auto(game, delay_ms, json).await,
    }
}

#[instrument]
fn initialize_tracing() {
    // Logs go to stderr so they stay out of the board on stdout.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    info!("Tracing initialized");
}

/// Loads the config file, if any, and applies command-line overrides.
#[instrument]
fn load_config(game: &GameArgs) -> Result<SessionConfig> {
    let config = match &game.config {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::new(),
    };
    Ok(config.with_overrides(game.board_size, game.players, game.pieces))
}

/// Play at the terminal
#[instrument(skip_all)]
async fn run_play(game: GameArgs, bots: Vec<usize>) -> Result<()> {
    let config = load_config(&game)?;
    let seats = *config.setup_options().num_players();
    let input = ConsolePlayer::stdin_input();

    let players: Vec<Box<dyn Player>> = (0..seats)
        .map(|seat| -> Box<dyn Player> {
            if bots.contains(&seat) {
                Box::new(
                    FirstLegalPlayer::new(format!("Bot {seat}"))
                        .with_delay(Duration::from_millis(300)),
                )
            } else {
                Box::new(ConsolePlayer::new(format!("Player {seat}"), input.clone()))
            }
        })
        .collect();

    run_session(config, players, false).await?;
    Ok(())
}

/// Let bots play every seat
#[instrument(skip_all)]
async fn run_auto(game: GameArgs, delay_ms: u64, json: bool) -> Result<()> {
    let config = load_config(&game)?;
    let seats = *config.setup_options().num_players();

    let players: Vec<Box<dyn Player>> = (0..seats)
        .map(|seat| -> Box<dyn Player> {
            Box::new(
                FirstLegalPlayer::new(format!("Bot {seat}"))
                    .with_delay(Duration::from_millis(delay_ms)),
            )
        })
        .collect();

    let outcome = run_session(config, players, json).await?;
    if json {
        println!("{}", serde_json::to_string(&outcome)?);
    }
    Ok(())
}

async fn run_session(
    config: SessionConfig,
    players: Vec<Box<dyn Player>>,
    quiet: bool,
) -> Result<Outcome> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if quiet {
                continue;
            }
            match event {
                GameEvent::StateChanged(board) => println!("{board}"),
                GameEvent::ActionIgnored { player, action } => {
                    println!("{player}: '{action}' does not fit right now")
                }
                GameEvent::GameOver { winner, scores } => {
                    println!("Player {winner} wins with scores {scores:?}")
                }
            }
        }
    });

    let controller = SessionController::new(Arc::new(LocalEngine::new()), config);
    let mut orchestrator = Orchestrator::new(controller, players, event_tx);
    let outcome = orchestrator.run().await;
    drop(orchestrator);
    printer.await?;

    let outcome = outcome?;
    match &outcome {
        Outcome::Finished { winner, .. } => info!(winner, "Session finished"),
        Outcome::Quit { player } => info!(player, "Session abandoned"),
    }
    Ok(outcome)
}
