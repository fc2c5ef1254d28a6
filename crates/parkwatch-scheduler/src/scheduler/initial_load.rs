use std::collections::HashSet;
use std::time::Duration;

use parkwatch_core::{Coordinate, FacilityRecord, InitialLoadProgress};

use super::fetch::Tally;
use super::{RefreshOutcome, RefreshScheduler};
use crate::location::nearest;

#[derive(Debug, Clone, Copy)]
enum Phase {
    Favourites,
    Nearest,
    Remaining,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Favourites => "favourite",
            Phase::Nearest => "nearest",
            Phase::Remaining => "remaining",
        }
    }

    fn progress(self, current: usize, total: usize) -> InitialLoadProgress {
        match self {
            Phase::Favourites => InitialLoadProgress::LoadingFavourites(current, total),
            Phase::Nearest => InitialLoadProgress::LoadingNearest(current, total),
            Phase::Remaining => InitialLoadProgress::LoadingRemaining(current, total),
        }
    }
}

/// Priority partition of one store snapshot. Every record lands in exactly
/// one phase.
#[derive(Debug, Default)]
pub(super) struct LoadPlan {
    pub favourites: Vec<FacilityRecord>,
    pub nearest: Vec<FacilityRecord>,
    pub remaining: Vec<FacilityRecord>,
}

impl LoadPlan {
    /// Favourites in store order; then the `nearest_count` records nearest
    /// `from` minus favourites, nearest-first; then everything else in
    /// store order.
    pub fn build(all: Vec<FacilityRecord>, from: &Coordinate, nearest_count: usize) -> Self {
        let closest = nearest(&all, from, nearest_count);
        let nearest_ids: HashSet<String> = closest
            .iter()
            .map(|r| r.facility_id().to_string())
            .collect();
        let nearest_phase: Vec<FacilityRecord> =
            closest.into_iter().filter(|r| !r.is_favourite()).collect();

        let mut plan = LoadPlan {
            nearest: nearest_phase,
            ..LoadPlan::default()
        };
        for record in all {
            if record.is_favourite() {
                plan.favourites.push(record);
            } else if !nearest_ids.contains(record.facility_id()) {
                plan.remaining.push(record);
            }
        }
        plan
    }

    pub fn len(&self) -> usize {
        self.favourites.len() + self.nearest.len() + self.remaining.len()
    }
}

impl RefreshScheduler {
    /// One-time priority-ordered fetch of every stored facility.
    ///
    /// Publishes progress after each facility, commits once at the end, and
    /// finishes with [`InitialLoadProgress::Completed`]. A failing facility
    /// never aborts the load. Skipped if another run is in progress.
    pub async fn perform_initial_load(&self) -> RefreshOutcome {
        let Some(_guard) = self.try_begin() else {
            tracing::info!("scheduler: initial load skipped; refresh already in progress");
            return RefreshOutcome::Skipped;
        };

        tracing::info!("scheduler: initial load starting");
        self.publish_progress(InitialLoadProgress::LoadingFavourites(0, 0));

        let all = match self.store.fetch_all().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "scheduler: failed to read facilities for initial load");
                Vec::new()
            }
        };

        let plan = LoadPlan::build(
            all,
            &self.location.current_coordinate(),
            self.config.nearest_count,
        );
        tracing::info!(
            total = plan.len(),
            favourites = plan.favourites.len(),
            nearest = plan.nearest.len(),
            remaining = plan.remaining.len(),
            "scheduler: initial load plan"
        );

        let mut tally = Tally::default();
        self.load_phase(Phase::Favourites, plan.favourites, Duration::ZERO, &mut tally)
            .await;
        self.load_phase(Phase::Nearest, plan.nearest, Duration::ZERO, &mut tally)
            .await;
        self.load_phase(
            Phase::Remaining,
            plan.remaining,
            self.config.remaining_delay,
            &mut tally,
        )
        .await;

        self.commit().await;
        self.publish_progress(InitialLoadProgress::Completed);
        self.mark_refreshed();

        tracing::info!(
            succeeded = tally.succeeded,
            failed = tally.failed,
            stats = %self.state().stats,
            "scheduler: initial load complete"
        );
        RefreshOutcome::Completed {
            succeeded: tally.succeeded,
            failed: tally.failed,
        }
    }

    async fn load_phase(
        &self,
        phase: Phase,
        records: Vec<FacilityRecord>,
        extra_delay: Duration,
        tally: &mut Tally,
    ) {
        let total = records.len();
        if total == 0 {
            tracing::debug!(phase = phase.label(), "scheduler: no facilities in phase");
            return;
        }

        tracing::info!(phase = phase.label(), count = total, "scheduler: loading phase");
        self.publish_progress(phase.progress(0, total));

        for (index, record) in records.iter().enumerate() {
            let ok = self
                .refresh_record(record.facility_id(), phase.label(), extra_delay)
                .await;
            tally.add(ok);
            self.publish_progress(phase.progress(index + 1, total));
        }
    }
}
