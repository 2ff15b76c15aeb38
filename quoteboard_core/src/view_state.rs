//! Observable view state shared between the refresh scheduler and the presentation
//! layer.
//!
//! `ViewState` keeps the latest inputs (snapshot and filter/sort parameters) and the
//! view derived from them. Recomputation runs outside the lock; the result is only
//! swapped in if no newer input arrived meanwhile, otherwise it is computed again.
//! A published view therefore always matches the most recent snapshot *and* the
//! most recent parameters.
//!
//! Every observable change is broadcast to subscribers as a [`ViewUpdate`] over a
//! `crossbeam_channel`. Subscribers get a `Receiver` only; they cannot write back.
//! Disconnected subscribers are dropped on the next broadcast.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, warn};

use crate::aggregation::{DerivedView, derive};
use crate::error::BoardError;
use crate::model::{FilterSortParams, Snapshot, SortField};
use crate::result::Result;

/// What the presentation layer should show around the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    /// No data yet and nothing failed (before or during the first poll).
    Empty,
    /// Data is current.
    Ready,
    /// The last refresh failed; older data is still shown.
    Stale { error: String },
    /// Refreshing failed and there has never been data: a blocking error.
    Unavailable { error: String },
}

impl ViewStatus {
    pub fn error(&self) -> Option<&str> {
        match self {
            ViewStatus::Stale { error } | ViewStatus::Unavailable { error } => Some(error.as_str()),
            ViewStatus::Empty | ViewStatus::Ready => None,
        }
    }
}

/// Why a [`ViewUpdate`] was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    ParamsChanged,
    SnapshotPublished,
    RefreshStarted,
    RefreshFailed,
    Closed,
}

/// Everything the presentation layer reads, captured at one instant.
#[derive(Debug, Clone)]
pub struct BoardState {
    pub view: Arc<DerivedView>,
    pub status: ViewStatus,
    pub refreshing: bool,
    /// Completion time of the last successful refresh.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Change notification sent to subscribers.
#[derive(Debug, Clone)]
pub struct ViewUpdate {
    pub reason: UpdateReason,
    pub state: BoardState,
}

struct Inner {
    // inputs
    snapshot: Option<Arc<Snapshot>>,
    params: FilterSortParams,
    generation: u64,
    // published outputs, always swapped together
    view_snapshot: Option<Arc<Snapshot>>,
    view: Arc<DerivedView>,

    error: Option<String>,
    refreshing: bool,
    last_updated: Option<DateTime<Utc>>,
    closed: bool,
    subscribers: Vec<Sender<ViewUpdate>>,
}

impl Inner {
    fn status(&self) -> ViewStatus {
        match (&self.error, self.view_snapshot.is_some()) {
            (None, false) => ViewStatus::Empty,
            (None, true) => ViewStatus::Ready,
            (Some(error), true) => ViewStatus::Stale {
                error: error.clone(),
            },
            (Some(error), false) => ViewStatus::Unavailable {
                error: error.clone(),
            },
        }
    }

    fn state(&self) -> BoardState {
        BoardState {
            view: Arc::clone(&self.view),
            status: self.status(),
            refreshing: self.refreshing,
            last_updated: self.last_updated,
        }
    }

    fn notify(&mut self, reason: UpdateReason) {
        let update = ViewUpdate {
            reason,
            state: self.state(),
        };
        self.subscribers
            .retain(|subscriber| subscriber.send(update.clone()).is_ok());
    }
}

/// Current snapshot, parameters, derived view and refresh status.
pub struct ViewState {
    inner: Mutex<Inner>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(FilterSortParams::default())
    }
}

impl ViewState {
    pub fn new(params: FilterSortParams) -> Self {
        Self {
            inner: Mutex::new(Inner {
                snapshot: None,
                view: Arc::new(DerivedView::empty(params.clone())),
                params,
                generation: 0,
                view_snapshot: None,
                error: None,
                refreshing: false,
                last_updated: None,
                closed: false,
                subscribers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        Ok(self.inner.lock()?)
    }

    /// Registers a new observer.
    pub fn subscribe(&self) -> Result<Receiver<ViewUpdate>> {
        let (tx, rx) = unbounded();
        let mut inner = self.lock()?;
        inner.subscribers.push(tx);
        debug!("View subscriber added. Total: {}", inner.subscribers.len());
        Ok(rx)
    }

    /// Replaces the filter/sort parameters and recomputes the view.
    pub fn set_params(&self, params: FilterSortParams) -> Result<()> {
        self.update_inputs(
            UpdateReason::ParamsChanged,
            |inner| {
                inner.params = params;
                true
            },
            |_| {},
        )
        .map(|_| ())
    }

    /// Replaces only the search text.
    pub fn set_search(&self, search: &str) -> Result<()> {
        self.update_inputs(
            UpdateReason::ParamsChanged,
            |inner| {
                inner.params.search = search.to_string();
                true
            },
            |_| {},
        )
        .map(|_| ())
    }

    /// Column-header sort: see [`FilterSortParams::toggle_sort`].
    pub fn toggle_sort(&self, field: SortField) -> Result<()> {
        self.update_inputs(
            UpdateReason::ParamsChanged,
            |inner| {
                inner.params.toggle_sort(field);
                true
            },
            |_| {},
        )
        .map(|_| ())
    }

    /// Publishes a freshly fetched snapshot.
    ///
    /// Clears any previous error and stamps the completion time. Returns `false`
    /// without touching anything when the state has been closed.
    pub fn publish_snapshot(&self, snapshot: Snapshot) -> Result<bool> {
        if snapshot.is_empty() {
            warn!("Publishing an empty snapshot");
        }
        let snapshot = Arc::new(snapshot);
        self.update_inputs(
            UpdateReason::SnapshotPublished,
            |inner| {
                if inner.closed {
                    return false;
                }
                inner.snapshot = Some(snapshot);
                true
            },
            |inner| {
                inner.error = None;
                inner.refreshing = false;
                inner.last_updated = Some(Utc::now());
            },
        )
    }

    /// Marks a refresh as in progress.
    pub fn begin_refresh(&self) -> Result<bool> {
        let mut inner = self.lock()?;
        if inner.closed {
            return Ok(false);
        }
        inner.refreshing = true;
        inner.notify(UpdateReason::RefreshStarted);
        Ok(true)
    }

    /// Records a failed refresh. Existing data is kept.
    pub fn record_failure(&self, error: &BoardError) -> Result<bool> {
        let mut inner = self.lock()?;
        if inner.closed {
            return Ok(false);
        }
        inner.error = Some(error.to_string());
        inner.refreshing = false;
        inner.notify(UpdateReason::RefreshFailed);
        Ok(true)
    }

    /// Stops accepting snapshots and refresh reports. Parameter changes still apply.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.closed {
            return Ok(());
        }
        inner.closed = true;
        inner.refreshing = false;
        inner.notify(UpdateReason::Closed);
        Ok(())
    }

    pub fn is_closed(&self) -> Result<bool> {
        Ok(self.lock()?.closed)
    }

    pub fn current(&self) -> Result<BoardState> {
        Ok(self.lock()?.state())
    }

    pub fn view(&self) -> Result<Arc<DerivedView>> {
        Ok(Arc::clone(&self.lock()?.view))
    }

    /// Snapshot the current view was derived from.
    pub fn snapshot(&self) -> Result<Option<Arc<Snapshot>>> {
        Ok(self.lock()?.view_snapshot.clone())
    }

    pub fn params(&self) -> Result<FilterSortParams> {
        Ok(self.lock()?.params.clone())
    }

    pub fn status(&self) -> Result<ViewStatus> {
        Ok(self.lock()?.status())
    }

    pub fn is_refreshing(&self) -> Result<bool> {
        Ok(self.lock()?.refreshing)
    }

    pub fn last_error(&self) -> Result<Option<String>> {
        Ok(self.lock()?.error.clone())
    }

    pub fn last_updated(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lock()?.last_updated)
    }

    /// Poisons the inner lock by panicking while it is held.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = self.inner.lock();
                    panic!("poisoning view state lock");
                })
                .join()
        });
    }

    /// Applies `commit` to the inputs, then derives and swaps in a new view.
    ///
    /// `commit` returns `false` to abort. `on_swap` runs under the lock together
    /// with the swap. A snapshot reaching the swap after `close` is dropped. If another input lands while deriving, the derivation is
    /// repeated against the newer inputs.
    fn update_inputs<C, S>(&self, reason: UpdateReason, commit: C, on_swap: S) -> Result<bool>
    where
        C: FnOnce(&mut Inner) -> bool,
        S: FnOnce(&mut Inner),
    {
        {
            let mut inner = self.lock()?;
            if !commit(&mut inner) {
                return Ok(false);
            }
            inner.generation += 1;
        }

        let mut on_swap = Some(on_swap);
        loop {
            let (snapshot, params, generation) = {
                let inner = self.lock()?;
                (inner.snapshot.clone(), inner.params.clone(), inner.generation)
            };

            let view = match &snapshot {
                Some(snapshot) => derive(snapshot, &params),
                None => DerivedView::empty(params),
            };

            let mut inner = self.lock()?;
            if inner.closed && reason == UpdateReason::SnapshotPublished {
                debug!("View state closed while deriving, dropping snapshot");
                return Ok(false);
            }
            if inner.generation != generation {
                debug!("Inputs changed while deriving, recomputing");
                continue;
            }
            inner.view = Arc::new(view);
            inner.view_snapshot = snapshot;
            if let Some(on_swap) = on_swap.take() {
                on_swap(&mut inner);
            }
            inner.notify(reason);
            return Ok(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Quote, SortDirection};
    use crate::seed::default_seed;

    fn snapshot() -> Snapshot {
        Snapshot::new(default_seed()).unwrap()
    }

    #[test]
    fn test_initial_state_is_empty() {
        let state = ViewState::default();
        assert_eq!(state.status().unwrap(), ViewStatus::Empty);
        assert!(state.view().unwrap().quotes.is_empty());
        assert!(state.snapshot().unwrap().is_none());
        assert!(!state.is_refreshing().unwrap());
        assert!(state.last_updated().unwrap().is_none());
    }

    #[test]
    fn test_publish_recomputes_with_current_params() {
        let state = ViewState::new(FilterSortParams::default().with_search("inc"));
        state.publish_snapshot(snapshot()).unwrap();

        let view = state.view().unwrap();
        assert!(view.quotes.iter().all(|q| q.name.to_lowercase().contains("inc")));
        assert_eq!(view.params.search, "inc");
        assert_eq!(view.stats.total, 10);
        assert_eq!(state.status().unwrap(), ViewStatus::Ready);
        assert!(state.last_updated().unwrap().is_some());
    }

    #[test]
    fn test_set_params_recomputes_against_latest_snapshot() {
        let state = ViewState::default();
        state.publish_snapshot(snapshot()).unwrap();
        state
            .set_params(FilterSortParams::default().with_sort(SortField::Price, SortDirection::Desc))
            .unwrap();

        let view = state.view().unwrap();
        assert_eq!(view.quotes[0].symbol, "AMZN");
        assert_eq!(view.captured_at, Some(state.snapshot().unwrap().unwrap().captured_at()));
    }

    #[test]
    fn test_toggle_sort_and_search() {
        let state = ViewState::default();
        state.publish_snapshot(snapshot()).unwrap();
        state.toggle_sort(SortField::Symbol).unwrap();
        assert_eq!(state.view().unwrap().quotes[0].symbol, "TSLA");

        state.set_search("a").unwrap();
        let params = state.params().unwrap();
        assert_eq!(params.search, "a");
        assert_eq!(params.sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_failure_without_data_is_blocking() {
        let state = ViewState::default();
        state.begin_refresh().unwrap();
        state
            .record_failure(&BoardError::SourceUnavailable("down".into()))
            .unwrap();

        match state.status().unwrap() {
            ViewStatus::Unavailable { error } => assert!(error.contains("down")),
            other => panic!("Expected Unavailable, got {other:?}"),
        }
        assert!(state.view().unwrap().quotes.is_empty());
        assert!(!state.is_refreshing().unwrap());
    }

    #[test]
    fn test_failure_with_data_keeps_view() {
        let state = ViewState::default();
        state.publish_snapshot(snapshot()).unwrap();
        let before = state.view().unwrap();

        state
            .record_failure(&BoardError::SourceUnavailable("timeout".into()))
            .unwrap();

        assert!(matches!(state.status().unwrap(), ViewStatus::Stale { .. }));
        assert_eq!(*state.view().unwrap(), *before);
        assert!(state.last_error().unwrap().is_some());

        state.publish_snapshot(snapshot()).unwrap();
        assert_eq!(state.status().unwrap(), ViewStatus::Ready);
        assert!(state.last_error().unwrap().is_none());
    }

    #[test]
    fn test_closed_state_rejects_snapshots_but_accepts_params() {
        let state = ViewState::default();
        state.publish_snapshot(snapshot()).unwrap();
        state.close().unwrap();

        let replacement = Snapshot::new(vec![Quote::new("NEW", "New Co", 1.0, 0.0, 0.0).unwrap()]).unwrap();
        assert!(!state.publish_snapshot(replacement).unwrap());
        assert!(!state.begin_refresh().unwrap());
        assert_eq!(state.view().unwrap().stats.total, 10);

        state.set_search("apple").unwrap();
        assert_eq!(state.view().unwrap().shown(), 1);
    }

    #[test]
    fn test_subscribers_are_notified_in_order() {
        let state = ViewState::default();
        let rx = state.subscribe().unwrap();

        state.begin_refresh().unwrap();
        state.publish_snapshot(snapshot()).unwrap();
        state.set_search("micro").unwrap();

        let reasons: Vec<UpdateReason> = rx.try_iter().map(|u| u.reason).collect();
        assert_eq!(
            reasons,
            vec![
                UpdateReason::RefreshStarted,
                UpdateReason::SnapshotPublished,
                UpdateReason::ParamsChanged
            ]
        );
    }

    #[test]
    fn test_dropped_subscriber_is_removed() {
        let state = ViewState::default();
        let rx = state.subscribe().unwrap();
        drop(rx);
        state.set_search("x").unwrap();
        assert!(state.lock().unwrap().subscribers.is_empty());
    }

    #[test]
    fn test_concurrent_writers_converge_on_latest_inputs() {
        let state = Arc::new(ViewState::default());
        let mut handles = Vec::new();
        for i in 0..8 {
            let state = Arc::clone(&state);
            handles.push(std::thread::spawn(move || {
                for _ in 0..20 {
                    if i % 2 == 0 {
                        state.publish_snapshot(snapshot()).unwrap();
                    } else {
                        state.toggle_sort(SortField::Price).unwrap();
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let latest = state.snapshot().unwrap().unwrap();
        let params = state.params().unwrap();
        let view = state.view().unwrap();
        assert_eq!(*view, derive(&latest, &params));
    }

    #[test]
    fn test_close_while_deriving_drops_the_snapshot() {
        let quotes: Vec<Quote> = (0..200_000)
            .rev()
            .map(|i| Quote::new(&format!("S{i:06}"), &format!("Stock {i}"), 10.0, 0.0, 0.0).unwrap())
            .collect();
        let large = Snapshot::new(quotes).unwrap();
        let state = Arc::new(ViewState::new(
            FilterSortParams::default().with_sort(SortField::Name, SortDirection::Asc),
        ));
        let updates = state.subscribe().unwrap();

        let publisher = {
            let state = Arc::clone(&state);
            std::thread::spawn(move || state.publish_snapshot(large).unwrap())
        };
        std::thread::sleep(std::time::Duration::from_millis(20));
        state.close().unwrap();
        let total_at_close = state.view().unwrap().stats.total;
        let published = publisher.join().unwrap();

        assert_eq!(state.view().unwrap().stats.total, total_at_close);
        assert_eq!(state.snapshot().unwrap().is_some(), published);
        assert_eq!(state.last_updated().unwrap().is_some(), published);
        let reasons: Vec<UpdateReason> = updates.try_iter().map(|u| u.reason).collect();
        assert_eq!(reasons.last(), Some(&UpdateReason::Closed));
    }
}
