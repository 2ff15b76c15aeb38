//! Periodic refresh of the quote snapshot.
//!
//! `RefreshScheduler` owns a single worker thread that multiplexes three event
//! sources with crossbeam `select!`:
//! - a stop signal from [`RefreshScheduler::stop`],
//! - manual triggers from [`RefreshScheduler::refresh_now`],
//! - the poll timer.
//!
//! Fetching happens only on the worker, so two polls never overlap. Requests that
//! come in while a poll is running (manual or timer) are coalesced into it. A
//! failed poll keeps the last good snapshot and waits for the next regular tick.
//!
//! After `stop()` the scheduler is terminated for good and its `ViewState` closed;
//! a fetch that was in flight at that point is discarded when it resolves.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, select, unbounded};
use log::{debug, error, info, warn};
use strum_macros::Display;

use crate::config::validate_interval;
use crate::error::BoardError;
use crate::provider::SnapshotProvider;
use crate::result::Result;
use crate::view_state::ViewState;

/// Lifecycle state of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SchedulerState {
    /// Waiting for the next tick (or not started yet).
    Idle,
    /// A fetch is in flight.
    Polling,
    /// The last fetch failed; waiting for the next tick.
    Failed,
    /// Stopped; never polls again.
    Terminated,
}

/// Result of a [`RefreshScheduler::refresh_now`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RefreshOutcome {
    /// A new poll was triggered.
    Started,
    /// A poll was already in flight; the request was folded into it.
    Coalesced,
    /// `start` has not been called yet.
    NotRunning,
    /// The scheduler has been stopped.
    Stopped,
}

struct Control {
    state: SchedulerState,
    running: bool,
    trigger_tx: Option<Sender<()>>,
    stop_tx: Option<Sender<()>>,
}

/// Poll loop publishing provider snapshots into a [`ViewState`].
pub struct RefreshScheduler {
    provider: Mutex<Option<Box<dyn SnapshotProvider>>>,
    view_state: Arc<ViewState>,
    control: Arc<Mutex<Control>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new<P: SnapshotProvider + 'static>(provider: P, view_state: Arc<ViewState>) -> Self {
        Self {
            provider: Mutex::new(Some(Box::new(provider))),
            view_state,
            control: Arc::new(Mutex::new(Control {
                state: SchedulerState::Idle,
                running: false,
                trigger_tx: None,
                stop_tx: None,
            })),
            worker: Mutex::new(None),
        }
    }

    pub fn view_state(&self) -> Arc<ViewState> {
        Arc::clone(&self.view_state)
    }

    /// Starts polling every `interval`. The first poll fires immediately.
    pub fn start(&self, interval: Duration) -> Result<()> {
        validate_interval(interval)?;

        let mut control = self.control.lock()?;
        if control.state == SchedulerState::Terminated {
            return Err(BoardError::SchedulerTerminated);
        }
        if control.running {
            warn!("Refresh scheduler already running");
            return Err(BoardError::AlreadyRunning);
        }
        let provider = self
            .provider
            .lock()?
            .take()
            .ok_or(BoardError::AlreadyRunning)?;

        let (trigger_tx, trigger_rx) = unbounded::<()>();
        let (stop_tx, stop_rx) = unbounded::<()>();
        let worker = Worker {
            provider,
            control: Arc::clone(&self.control),
            view_state: Arc::clone(&self.view_state),
            interval,
            trigger_rx,
            stop_rx,
        };

        info!("Starting refresh scheduler with poll interval {:?}", interval);
        let handle = thread::spawn(move || worker.run());

        control.running = true;
        control.trigger_tx = Some(trigger_tx);
        control.stop_tx = Some(stop_tx);
        *self.worker.lock()? = Some(handle);
        Ok(())
    }

    /// Requests an out-of-band poll.
    ///
    /// Never queues a second fetch: while a poll is in flight the request is
    /// coalesced into it.
    pub fn refresh_now(&self) -> Result<RefreshOutcome> {
        let mut control = self.control.lock()?;
        let outcome = match control.state {
            SchedulerState::Terminated => RefreshOutcome::Stopped,
            _ if !control.running => RefreshOutcome::NotRunning,
            SchedulerState::Polling => RefreshOutcome::Coalesced,
            SchedulerState::Idle | SchedulerState::Failed => {
                let sent = control
                    .trigger_tx
                    .as_ref()
                    .map(|tx| tx.send(()).is_ok())
                    .unwrap_or(false);
                if !sent {
                    return Err(BoardError::ChannelSend(
                        "refresh worker is gone".to_string(),
                    ));
                }
                control.state = SchedulerState::Polling;
                RefreshOutcome::Started
            }
        };
        debug!("Manual refresh requested: {}", outcome);
        Ok(outcome)
    }

    /// Stops polling and closes the view state. Does not wait for an in-flight fetch.
    pub fn stop(&self) -> Result<()> {
        {
            let mut control = self.control.lock()?;
            if control.state == SchedulerState::Terminated {
                return Ok(());
            }
            control.state = SchedulerState::Terminated;
            control.trigger_tx = None;
            if let Some(stop_tx) = control.stop_tx.take() {
                let _ = stop_tx.send(());
            }
        }
        self.view_state.close()?;

        if let Some(handle) = self.worker.lock()?.take() {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                debug!("Refresh worker still fetching; it will exit when the fetch resolves");
            }
        }
        info!("Refresh scheduler stopped");
        Ok(())
    }

    pub fn state(&self) -> Result<SchedulerState> {
        Ok(self.control.lock()?.state)
    }

    pub fn is_running(&self) -> Result<bool> {
        let control = self.control.lock()?;
        Ok(control.running && control.state != SchedulerState::Terminated)
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

struct Worker {
    provider: Box<dyn SnapshotProvider>,
    control: Arc<Mutex<Control>>,
    view_state: Arc<ViewState>,
    interval: Duration,
    trigger_rx: Receiver<()>,
    stop_rx: Receiver<()>,
}

impl Worker {
    fn run(mut self) {
        info!("Refresh worker started (Thread ID: {:?})", thread::current().id());
        let mut next_tick = Instant::now();

        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            select! {
                recv(self.stop_rx) -> _ => break,
                recv(self.trigger_rx) -> msg => if msg.is_err() {
                    break;
                },
                default(timeout) => {},
            }

            match self.poll() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    error!("Refresh worker failed: {}", e);
                    self.abort();
                    break;
                }
            }

            // ticks that came due during the poll were coalesced into it
            let now = Instant::now();
            while next_tick <= now {
                next_tick += self.interval;
            }
        }
        info!("Refresh worker stopped");
    }

    /// Marks the scheduler terminated after the worker hit an unrecoverable error.
    fn abort(&self) {
        let mut control = match self.control.lock() {
            Ok(control) => control,
            Err(poisoned) => poisoned.into_inner(),
        };
        control.state = SchedulerState::Terminated;
        control.running = false;
        control.trigger_tx = None;
        control.stop_tx = None;
        drop(control);
        if let Err(e) = self.view_state.close() {
            warn!("Could not close view state after worker failure: {}", e);
        }
    }

    /// Runs one poll. Returns `Ok(false)` once the scheduler has been stopped.
    fn poll(&mut self) -> Result<bool> {
        {
            let mut control = self.control.lock()?;
            if control.state == SchedulerState::Terminated {
                return Ok(false);
            }
            control.state = SchedulerState::Polling;
        }
        self.view_state.begin_refresh()?;

        let started = Instant::now();
        let result = self.provider.fetch_snapshot();

        {
            let mut control = self.control.lock()?;
            if control.state == SchedulerState::Terminated {
                debug!("Discarding poll result that resolved after stop");
                return Ok(false);
            }
            control.state = match result {
                Ok(_) => SchedulerState::Idle,
                Err(_) => SchedulerState::Failed,
            };
            let coalesced = self.trigger_rx.try_iter().count();
            if coalesced > 0 {
                debug!("Coalesced {} refresh request(s) into the finished poll", coalesced);
            }
        }

        match result {
            Ok(snapshot) => {
                let count = snapshot.len();
                if self.view_state.publish_snapshot(snapshot)? {
                    info!("Published snapshot with {} quotes in {:?}", count, started.elapsed());
                }
            }
            Err(e) => {
                error!("Quote refresh failed: {}", e);
                self.view_state.record_failure(&e)?;
            }
        }
        Ok(true)
    }
}
