//! Immutable, timestamped quote sets.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::BoardError;
use crate::model::quote::Quote;
use crate::result::Result;

/// Full set of quotes captured at one instant.
///
/// A snapshot is never mutated after construction; a refresh builds a new one.
/// Quote order carries no meaning but is preserved, which keeps stable sorting
/// reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    quotes: Vec<Quote>,
    captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Builds a snapshot stamped with the current time.
    pub fn new(quotes: Vec<Quote>) -> Result<Self> {
        Self::with_capture_time(quotes, Utc::now())
    }

    /// Builds a snapshot with an explicit capture time.
    ///
    /// Fails with `DuplicateSymbol` when two quotes share a symbol, ignoring case.
    pub fn with_capture_time(quotes: Vec<Quote>, captured_at: DateTime<Utc>) -> Result<Self> {
        check_unique_symbols(&quotes)?;
        Ok(Self {
            quotes,
            captured_at,
        })
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Looks a quote up by symbol, ignoring case.
    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        let key = symbol.to_lowercase();
        self.quotes.iter().find(|q| q.symbol_key() == key)
    }

    pub fn into_quotes(self) -> Vec<Quote> {
        self.quotes
    }
}

/// Fails with `DuplicateSymbol` on the first symbol that repeats, ignoring case.
pub fn check_unique_symbols(quotes: &[Quote]) -> Result<()> {
    let mut seen = HashSet::with_capacity(quotes.len());
    for quote in quotes {
        if !seen.insert(quote.symbol_key()) {
            return Err(BoardError::DuplicateSymbol(quote.symbol.clone()));
        }
    }
    Ok(())
}
