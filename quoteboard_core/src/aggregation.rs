//! Derivation of filtered, sorted views and market statistics.
//!
//! Everything here is a pure function of its inputs: no clocks, no randomness, no
//! locale. String keys are compared by their `str::to_lowercase` form, which is
//! defined by Unicode and not by the host locale.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::quote::round_to_cents;
use crate::model::{FilterSortParams, Quote, Snapshot, SortDirection, SortField};

/// Aggregate figures over a whole snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarketStats {
    pub total: usize,
    /// Quotes with a strictly positive change percent.
    pub gainers: usize,
    /// Quotes with a strictly negative change percent.
    pub losers: usize,
    /// Mean change percent, rounded to two decimals; 0 for an empty snapshot.
    pub average_change_percent: f64,
}

/// Filtered and sorted projection of a snapshot plus its statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView {
    pub quotes: Vec<Quote>,
    pub stats: MarketStats,
    /// Parameters the view was computed with.
    pub params: FilterSortParams,
    /// Capture time of the source snapshot; `None` before the first snapshot.
    pub captured_at: Option<DateTime<Utc>>,
}

impl DerivedView {
    /// The view shown while no snapshot exists.
    pub fn empty(params: FilterSortParams) -> Self {
        Self {
            quotes: Vec::new(),
            stats: MarketStats::default(),
            params,
            captured_at: None,
        }
    }

    /// Number of quotes that passed the filter.
    pub fn shown(&self) -> usize {
        self.quotes.len()
    }
}

/// Computes the view of `snapshot` under `params`.
pub fn derive(snapshot: &Snapshot, params: &FilterSortParams) -> DerivedView {
    let mut quotes: Vec<Quote> = snapshot
        .quotes()
        .iter()
        .filter(|quote| matches_search(quote, &params.search))
        .cloned()
        .collect();
    sort_quotes(&mut quotes, params.sort.field, params.sort.direction);

    DerivedView {
        quotes,
        stats: compute_stats(snapshot.quotes()),
        params: params.clone(),
        captured_at: Some(snapshot.captured_at()),
    }
}

/// Whether `quote` passes the search filter.
///
/// A blank search keeps everything; otherwise the lowercase search must occur in the
/// lowercase symbol or name.
pub fn matches_search(quote: &Quote, search: &str) -> bool {
    if search.trim().is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    quote.symbol.to_lowercase().contains(&needle) || quote.name.to_lowercase().contains(&needle)
}

/// Stable in-place sort: equal keys keep their input order in either direction.
pub fn sort_quotes(quotes: &mut [Quote], field: SortField, direction: SortDirection) {
    quotes.sort_by(|a, b| {
        let ordering = compare_by(a, b, field);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_by(a: &Quote, b: &Quote, field: SortField) -> Ordering {
    match field {
        SortField::Symbol => a.symbol.to_lowercase().cmp(&b.symbol.to_lowercase()),
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Change => a.change.total_cmp(&b.change),
        SortField::ChangePercent => a.change_percent.total_cmp(&b.change_percent),
    }
}

/// Statistics over every quote given, regardless of any filter.
pub fn compute_stats(quotes: &[Quote]) -> MarketStats {
    let total = quotes.len();
    if total == 0 {
        return MarketStats::default();
    }
    let gainers = quotes.iter().filter(|q| q.is_gainer()).count();
    let losers = quotes.iter().filter(|q| q.is_loser()).count();
    let sum: f64 = quotes.iter().map(|q| q.change_percent).sum();

    MarketStats {
        total,
        gainers,
        losers,
        average_change_percent: round_to_cents(sum / total as f64),
    }
}
