//! Quote snapshot providers.
//!
//! A provider yields a complete, validated [`Snapshot`] on every call. Two
//! implementations ship with the crate:
//! - `simulated`: a random walk over a seed quote set, for demos and tests.
//! - `feed`: adapts an upstream feed of raw "Global Quote" records, validating each
//!   record at the boundary so nothing untyped reaches the aggregation engine.

use crate::error::BoardError;
use crate::model::Snapshot;
use crate::result::Result;

pub mod feed;
pub mod simulated;

pub use feed::{FeedProvider, JsonFileFeed, QuoteFeed, RawQuoteRecord};
pub use simulated::SimulatedProvider;

/// Source of full quote snapshots.
///
/// Called only from the scheduler's worker thread, one call at a time, so
/// implementations may keep mutable state between calls.
pub trait SnapshotProvider: Send {
    /// Produces the current snapshot.
    ///
    /// Fails with [`BoardError::SourceUnavailable`] when the upstream data cannot be
    /// obtained.
    fn fetch_snapshot(&mut self) -> Result<Snapshot>;
}

impl<P: SnapshotProvider + ?Sized> SnapshotProvider for Box<P> {
    fn fetch_snapshot(&mut self) -> Result<Snapshot> {
        (**self).fetch_snapshot()
    }
}

/// Folds any error into `SourceUnavailable`, keeping its message.
pub(crate) fn unavailable(err: BoardError) -> BoardError {
    match err {
        BoardError::SourceUnavailable(_) => err,
        other => BoardError::SourceUnavailable(other.to_string()),
    }
}
