//! Wallgo - session controller for wall-go
//!
//! Drives a wall-go session against an authoritative rules engine: the
//! snake-draft setup, the move-then-wall protocol of the main phase, and the
//! bookkeeping that keeps everything the players see consistent with the
//! engine's latest snapshot.
//!
//! # Architecture
//!
//! - **Engine**: the [`RulesEngine`] seam and the in-process [`LocalEngine`]
//! - **Setup**: option form and [`SetupAllocator`] snake draft
//! - **Protocol**: the single pending [`Interaction`] of a main-phase turn
//! - **State**: [`SessionState`] and idempotent snapshot reconciliation
//! - **Controller**: [`SessionController`], the only writer of session state
//! - **Players**: bots and console players driven by an [`Orchestrator`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wallgo::{Cell, LocalEngine, SessionConfig, SessionController};
//!
//! # async fn example() -> Result<(), wallgo::SessionError> {
//! let mut session = SessionController::new(Arc::new(LocalEngine::new()), SessionConfig::new());
//! session.connect().await?;
//! session.submit_options()?;
//! session.place_token(Cell::new(0, 0)).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod controller;
mod engine;
mod error;
mod orchestrator;
mod protocol;
mod render;
mod resolver;
mod setup;
mod snapshot;
mod state;

pub mod players;

// Crate-level exports - Configuration and errors
pub use config::{ConfigError, SessionConfig};
pub use error::{EngineError, SessionError};

// Crate-level exports - Engine seam
pub use engine::{LocalEngine, RulesEngine};
pub use snapshot::Snapshot;

// Crate-level exports - Session
pub use controller::{Dispatch, Readiness, Resolution, SessionController};
pub use protocol::{Interaction, InteractionKind};
pub use resolver::{SelectableBatch, SelectableQuery};
pub use setup::{Direction, SetupAllocator, SetupCompletion, SetupOptions};
pub use state::{SessionState, Stage};

// Crate-level exports - Running games
pub use orchestrator::{GameEvent, Orchestrator, Outcome};
pub use render::render;

// Crate-level exports - Rule types
pub use wallgo_rules::{Cell, Grid, Orientation, Phase, PlacedWall, PlayerId, Wall};
