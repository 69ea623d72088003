//! Error types for the session controller.

use derive_more::{Display, Error, From};
use tracing::instrument;

/// Failure reported by (or about) the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum EngineError {
    /// The engine never became available.
    #[display("Rules engine unavailable: {}", _0)]
    Unavailable(#[error(not(source))] String),

    /// The engine refused an operation.
    #[display("Rules engine rejected the request: {}", _0)]
    Rejected(#[error(not(source))] String),

    /// The engine answered with a state that breaks the snapshot contract.
    #[display("Malformed snapshot: {}", _0)]
    Malformed(#[error(not(source))] String),
}

/// Error returned by session controller operations.
///
/// Inputs that simply do not fit the current interaction are not errors;
/// they come back as [`Dispatch::Ignored`](crate::Dispatch::Ignored).
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum SessionError {
    /// The rules engine has not been connected, or failed to start.
    #[display("Session not ready: rules engine unavailable")]
    #[from(ignore)]
    NotReady,

    /// A rules engine call failed.
    #[display("{}", _0)]
    Engine(EngineError),

    /// Turns keep being skipped without anyone able to move.
    #[display("Stalemate: {} consecutive turns skipped", skipped)]
    #[from(ignore)]
    Stalemate {
        /// Number of forced skips in a row.
        skipped: usize,
    },
}

impl SessionError {
    /// Wraps an engine failure, recording where it surfaced.
    #[track_caller]
    #[instrument]
    pub fn engine(err: EngineError) -> Self {
        let loc = std::panic::Location::caller();
        tracing::warn!(error = %err, file = loc.file(), line = loc.line(), "Engine call failed");
        Self::Engine(err)
    }
}
