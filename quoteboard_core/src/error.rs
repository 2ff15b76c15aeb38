//! Error types shared by the quote board core and its consumers.
//!
//! The `BoardError` enum unifies upstream failures, quote validation problems,
//! scheduler lifecycle misuse, and the usual I/O, JSON, and lock failures, so
//! every crate in the workspace can propagate a single error type.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

/// Unified error type of the quote board.
#[derive(Error, Debug)]
pub enum BoardError {
    /// The quote source could not be reached or returned unusable data
    /// (network/I/O failure, malformed response, timeout).
    #[error("Quote source unavailable: {0}")]
    SourceUnavailable(String),

    /// A quote record violates the data model invariants.
    #[error("Invalid quote: {0}")]
    InvalidQuote(String),

    /// Two quotes in one snapshot share a symbol (compared case-insensitively).
    #[error("Duplicate symbol in snapshot: {0}")]
    DuplicateSymbol(String),

    /// Error while parsing a seed quote file.
    #[error("Parse seed file error: {0}")]
    ParseSeedFile(String),

    /// Invalid runtime configuration (zero poll interval, bad latency range, ...).
    #[error("Configuration error: {0}")]
    Config(String),

    /// `start` was called on a scheduler that is already polling.
    #[error("Refresh scheduler is already running")]
    AlreadyRunning,

    /// `start` was called on a scheduler after `stop`.
    #[error("Refresh scheduler has been terminated")]
    SchedulerTerminated,

    /// I/O error originating from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Crossbeam channel send failed (receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// A poisoned mutex was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

impl<T> From<PoisonError<T>> for BoardError {
    fn from(err: PoisonError<T>) -> Self {
        BoardError::MutexLock(err.to_string())
    }
}
