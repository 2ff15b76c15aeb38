//! Quote Board console: a headless front end for the quote board core.
//!
//! It polls a quote source on a fixed cadence (simulated by default, or an upstream
//! response file), keeps a filtered and sorted view of the latest snapshot, and logs
//! every view change. Filter, sort and manual refresh are driven from stdin.
//!
//! Usage example (CLI):
//! ```bash
//! quoteboard --interval-ms 5000 --search inc --sort change_percent --direction desc
//! ```
//!
//! See `console` for the interactive commands.
mod args;
mod console;
mod render;

use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{never, select, tick, unbounded};
use log::{info, warn};
use quoteboard_core::config::SIMULATED_LATENCY_MS;
use quoteboard_core::{
    BoardConfig, BoardError, FeedProvider, FilterSortParams, JsonFileFeed, Quote, RefreshScheduler,
    Result, SimulatedProvider, SnapshotProvider, SortSpec, ViewState,
};

use crate::args::Args;
use crate::console::ConsoleCommand;

/// How often the main loop checks the Ctrl+C flag.
const SHUTDOWN_POLL_MS: u64 = 200;

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| BoardError::Config(format!("cannot install Ctrl+C handler: {e}")))?;
    }

    let interval = Duration::from_millis(args.interval_ms);
    let config = match &args.seed_file {
        Some(path) => BoardConfig::from_seed_file(path, interval)?,
        None => BoardConfig::with_interval(interval)?,
    };
    let provider = build_provider(&args, config.seed)?;

    let params = FilterSortParams::new(&args.search, SortSpec::new(args.sort, args.direction));
    let view_state = Arc::new(ViewState::new(params));
    let updates = view_state.subscribe()?;
    let scheduler = RefreshScheduler::new(provider, Arc::clone(&view_state));
    scheduler.start(config.poll_interval)?;

    let (command_tx, command_rx) = unbounded::<ConsoleCommand>();
    console::spawn_stdin_reader(command_tx);
    let mut command_rx = command_rx;
    let shutdown_tick = tick(Duration::from_millis(SHUTDOWN_POLL_MS));

    info!("Quote board is running. Type 'quit' or press Ctrl+C to exit.");
    loop {
        select! {
            recv(updates) -> msg => match msg {
                Ok(update) => render::render_update(&update),
                Err(_) => break,
            },
            recv(command_rx) -> msg => match msg {
                Ok(ConsoleCommand::Quit) => break,
                Ok(command) => handle_command(command, &scheduler, &view_state)?,
                Err(_) => {
                    info!("Stdin closed; interactive commands disabled");
                    command_rx = never();
                }
            },
            recv(shutdown_tick) -> _ => if shutdown.load(Ordering::SeqCst) {
                break;
            },
        }
    }

    scheduler.stop()?;
    Ok(())
}

fn build_provider(args: &Args, seed: Vec<Quote>) -> Result<Box<dyn SnapshotProvider>> {
    if let Some(feed_file) = &args.feed_file {
        info!("Reading quotes from upstream feed file {:?}", Path::new(feed_file));
        return Ok(Box::new(FeedProvider::new(JsonFileFeed::new(feed_file))));
    }

    let mut provider = SimulatedProvider::new(seed)?;
    if let Some(rng_seed) = args.rng_seed {
        provider = provider.with_seed(rng_seed);
    }
    if args.simulate_latency {
        let (min_ms, max_ms) = SIMULATED_LATENCY_MS;
        provider = provider.with_latency(min_ms, max_ms)?;
    }
    info!("Simulating {} quotes", provider.current().len());
    Ok(Box::new(provider))
}

fn handle_command(
    command: ConsoleCommand,
    scheduler: &RefreshScheduler,
    view_state: &ViewState,
) -> Result<()> {
    match command {
        ConsoleCommand::Search(text) => view_state.set_search(&text)?,
        ConsoleCommand::Clear => view_state.set_search("")?,
        ConsoleCommand::Sort(field) => view_state.toggle_sort(field)?,
        ConsoleCommand::Refresh => {
            let outcome = scheduler.refresh_now()?;
            info!("Refresh: {}", outcome);
        }
        ConsoleCommand::Show => {
            let state = view_state.current()?;
            if let Some(error) = state.status.error() {
                warn!("Last refresh failed: {}", error);
            }
            for line in render::render_lines(&state) {
                info!("{}", line);
            }
        }
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
