//! Core of the quote board: periodic market-data ingestion and in-memory
//! aggregation into filtered, sorted views with summary statistics.
//!
//! This crate aggregates:
//! - `error`: unified error type `BoardError`.
//! - `result`: handy `Result<T, BoardError>` alias.
//! - `model`: `Quote`, `Snapshot` and the filter/sort parameters.
//! - `seed`: built-in seed quotes and seed file parsing.
//! - `config`: poll interval and seed configuration.
//! - `provider`: snapshot sources, simulated or backed by an upstream feed.
//! - `aggregation`: pure derivation of views and market statistics.
//! - `view_state`: observable state mediating between scheduler and presentation.
//! - `scheduler`: the poll loop with request coalescing and safe shutdown.
pub mod aggregation;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod result;
pub mod scheduler;
pub mod seed;
pub mod view_state;

pub use aggregation::{DerivedView, MarketStats, derive};
pub use config::BoardConfig;
pub use error::BoardError;
pub use model::{FilterSortParams, Quote, Snapshot, SortDirection, SortField, SortSpec};
pub use provider::{FeedProvider, JsonFileFeed, SimulatedProvider, SnapshotProvider};
pub use result::Result;
pub use scheduler::{RefreshOutcome, RefreshScheduler, SchedulerState};
pub use view_state::{BoardState, UpdateReason, ViewState, ViewStatus, ViewUpdate};
