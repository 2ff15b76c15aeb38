//! Runtime configuration: poll cadence and the seed quote set.
//!
//! These are the only values the embedding application supplies; everything else
//! (filter, sort) is driven at runtime through `ViewState`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use log::info;

use crate::error::BoardError;
use crate::model::Quote;
use crate::result::Result;
use crate::seed::{QuoteParser, default_seed};

/// Default poll interval in milliseconds (30 seconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Artificial latency range of the simulated source, in milliseconds.
pub const SIMULATED_LATENCY_MS: (u64, u64) = (800, 1200);

/// Poll interval plus seed quotes.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub poll_interval: Duration,
    pub seed: Vec<Quote>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            seed: default_seed(),
        }
    }
}

impl BoardConfig {
    /// Builds a config with the built-in seed and a custom interval.
    pub fn with_interval(poll_interval: Duration) -> Result<Self> {
        validate_interval(poll_interval)?;
        Ok(Self {
            poll_interval,
            seed: default_seed(),
        })
    }

    /// Loads seed quotes from a JSON file.
    pub fn from_seed_file<P: AsRef<Path>>(path: P, poll_interval: Duration) -> Result<Self> {
        validate_interval(poll_interval)?;
        info!("Loading seed quotes from: {:?}", path.as_ref());
        let file = File::open(&path)?;
        let seed = Quote::parse_from_reader(BufReader::new(file))?;
        info!("Loaded {} seed quotes", seed.len());
        Ok(Self {
            poll_interval,
            seed,
        })
    }
}

/// A zero interval would turn the poll loop into a busy loop.
pub fn validate_interval(poll_interval: Duration) -> Result<()> {
    if poll_interval.is_zero() {
        return Err(BoardError::Config(
            "poll interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
