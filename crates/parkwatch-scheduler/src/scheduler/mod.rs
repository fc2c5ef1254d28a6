//! The occupancy refresh scheduler.
//!
//! One instance per process, shared behind an [`Arc`]. All refresh runs
//! (initial load, perpetual cycle, on-demand single refresh) are serialized
//! by a single `is_refreshing` flag; a run that finds the flag set is
//! skipped, never queued. Observers read [`SchedulerState`] from a `watch`
//! channel and never wait on a fetch.

mod cycle;
mod fetch;
mod initial_load;
mod on_demand;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use parkwatch_client::OccupancyClient;
use parkwatch_core::{InitialLoadProgress, RefreshStats};
use parkwatch_store::FacilityStore;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::lifecycle::Lifecycle;
use crate::location::LocationProvider;
use crate::rate_limit::RateLimiter;

/// Everything the presentation layer observes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerState {
    pub is_refreshing: bool,
    pub last_refresh_time: Option<DateTime<Utc>>,
    pub stats: RefreshStats,
    pub progress: InitialLoadProgress,
}

/// Result of one scheduler operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The run fetched `succeeded + failed` facilities and committed.
    Completed { succeeded: usize, failed: usize },
    /// Another run held the refresh flag.
    Skipped,
    /// The selection was empty; nothing was fetched or committed.
    NothingToRefresh,
    /// The facility's reading was fresh enough.
    UpToDate,
    /// No stored facility has the requested id.
    NotFound,
}

pub struct RefreshScheduler {
    store: Arc<dyn FacilityStore>,
    client: Arc<dyn OccupancyClient>,
    location: Arc<dyn LocationProvider>,
    lifecycle: Arc<Lifecycle>,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
    config: SchedulerConfig,
    refreshing: AtomicBool,
    state_tx: watch::Sender<SchedulerState>,
    auto_refresh: Mutex<Option<CancellationToken>>,
}

/// Holds the refresh flag; releases it on drop.
struct RefreshGuard<'a> {
    scheduler: &'a RefreshScheduler,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.scheduler.refreshing.store(false, Ordering::Release);
        self.scheduler
            .state_tx
            .send_modify(|state| state.is_refreshing = false);
    }
}

impl RefreshScheduler {
    /// Creates a scheduler using the system clock and a rate limiter sized
    /// from `config`.
    #[must_use]
    pub fn new(
        store: Arc<dyn FacilityStore>,
        client: Arc<dyn OccupancyClient>,
        location: Arc<dyn LocationProvider>,
        lifecycle: Arc<Lifecycle>,
        config: SchedulerConfig,
    ) -> Self {
        let (state_tx, _rx) = watch::channel(SchedulerState::default());
        Self {
            store,
            client,
            location,
            lifecycle,
            clock: Arc::new(SystemClock),
            limiter: RateLimiter::new(config.min_api_interval),
            config,
            refreshing: AtomicBool::new(false),
            state_tx,
            auto_refresh: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state_tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state_tx.subscribe()
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_auto_refreshing(&self) -> bool {
        self.auto_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Starts the perpetual refresh loop. Returns `false` if one is already
    /// running.
    ///
    /// The first cycle runs one lifecycle interval after this call. Each
    /// subsequent sleep uses the lifecycle state current at that moment.
    pub fn start_auto_refresh(self: &Arc<Self>) -> bool {
        let mut slot = self
            .auto_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|token| !token.is_cancelled()) {
            tracing::debug!("scheduler: auto refresh already running");
            return false;
        }

        let token = CancellationToken::new();
        *slot = Some(token.clone());
        drop(slot);

        tracing::info!("scheduler: starting auto refresh");
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_auto_refresh(token).await });
        true
    }

    /// Stops the perpetual loop. A cycle already in flight runs to
    /// completion; no further cycle starts. Safe to call repeatedly.
    pub fn stop_auto_refresh(&self) {
        let token = self
            .auto_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            token.cancel();
            tracing::info!("scheduler: stopping auto refresh");
        }
    }

    async fn run_auto_refresh(&self, cancel: CancellationToken) {
        loop {
            let state = self.lifecycle.current();
            let interval = self.config.tick_interval(state);
            tracing::debug!(state = %state, interval = ?interval, "scheduler: next cycle scheduled");

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }

            self.perform_refresh_cycle().await;
        }
        tracing::debug!("scheduler: auto refresh loop exited");
    }

    /// Claims the refresh flag, or `None` if another run holds it.
    fn try_begin(&self) -> Option<RefreshGuard<'_>> {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.state_tx
            .send_modify(|state| state.is_refreshing = true);
        Some(RefreshGuard { scheduler: self })
    }

    fn publish_progress(&self, progress: InitialLoadProgress) {
        self.state_tx.send_modify(|state| state.progress = progress);
    }

    fn mark_refreshed(&self) {
        let now = self.clock.now();
        self.state_tx
            .send_modify(|state| state.last_refresh_time = Some(now));
    }

    async fn commit(&self) {
        if let Err(e) = self.store.commit().await {
            tracing::error!(error = %e, "scheduler: store commit failed");
        }
    }
}
