//! Command-line arguments for the quote board console.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use quoteboard_core::config::DEFAULT_POLL_INTERVAL_MS;
use quoteboard_core::{SortDirection, SortField};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Poll interval in milliseconds.
    #[clap(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub interval_ms: u64,

    /// JSON file with the seed quotes of the simulated source.
    #[clap(long)]
    pub seed_file: Option<String>,

    /// Upstream response file ("Global Quote" JSON) re-read on every poll.
    /// Replaces the simulated source.
    #[clap(long, conflicts_with = "seed_file")]
    pub feed_file: Option<String>,

    /// Initial search text, matched against symbol or name.
    #[clap(long, default_value = "")]
    pub search: String,

    /// Initial sort field.
    #[clap(long, value_enum, default_value_t = SortField::Symbol)]
    pub sort: SortField,

    /// Initial sort direction.
    #[clap(long, value_enum, default_value_t = SortDirection::Asc)]
    pub direction: SortDirection,

    /// Delay simulated fetches by 800-1200 ms, like a remote API would.
    #[clap(long)]
    pub simulate_latency: bool,

    /// Fixed RNG seed for a reproducible simulated walk.
    #[clap(long)]
    pub rng_seed: Option<u64>,
}
