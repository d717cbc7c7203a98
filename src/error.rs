//! Failures that can happen while talking to an engine.
//!
//! Parsing problems with individual engine output lines are never reported
//! here: UCI engines differ in what they print and the client simply skips
//! lines it does not understand.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error returned by [`crate::uci::Client`] and everything built on top of it.
#[derive(Debug, Error)]
pub enum Error {
    /// The engine executable could not be started or did not complete the
    /// `uci`/`uciok` handshake in time. Nothing has been analyzed yet.
    #[error("failed to launch engine {}: {reason}", path.display())]
    Launch {
        /// Path of the engine executable.
        path: PathBuf,
        /// Human-readable cause.
        reason: String,
    },
    /// The channel to the engine broke: a write failed, the engine closed its
    /// output or the process died.
    #[error("engine protocol failure: {0}")]
    Protocol(String),
    /// The engine did not answer with `bestmove` within the configured bound.
    #[error("engine did not finish the search within {0:?}")]
    Timeout(Duration),
    /// The run was cancelled through a [`crate::uci::CancelToken`].
    #[error("benchmark was cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the run should stop regardless of the configured failure
    /// policy.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Launch { .. } | Self::Cancelled)
    }
}

/// Shorthand used throughout the engine-facing code.
pub type Result<T> = std::result::Result<T, Error>;
