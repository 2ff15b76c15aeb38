//! Data model of the quote board.
//!
//! - `quote`: a single instrument record and its validation rules.
//! - `snapshot`: an immutable, timestamped set of quotes.
//! - `params`: filter and sort parameters chosen by the presentation layer.

pub mod params;
pub mod quote;
pub mod snapshot;

pub use params::{FilterSortParams, SortDirection, SortField, SortSpec};
pub use quote::Quote;
pub use snapshot::Snapshot;
