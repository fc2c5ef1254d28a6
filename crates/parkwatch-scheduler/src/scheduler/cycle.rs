use std::time::Duration;

use parkwatch_core::FacilityRecord;

use super::fetch::Tally;
use super::{RefreshOutcome, RefreshScheduler};
use crate::location::nearest;

impl RefreshScheduler {
    /// One perpetual-cycle tick.
    ///
    /// Refreshes every favourite, or the nearest facilities when there are
    /// none, sequentially through the rate limiter, then commits once. If
    /// another run holds the refresh flag the tick does nothing at all.
    pub async fn perform_refresh_cycle(&self) -> RefreshOutcome {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!("scheduler: refresh cycle skipped; already refreshing");
            return RefreshOutcome::Skipped;
        };

        let selection = self.select_cycle_facilities().await;
        if selection.is_empty() {
            tracing::debug!("scheduler: no facilities to refresh");
            return RefreshOutcome::NothingToRefresh;
        }

        let now = self.clock.now();
        tracing::info!(
            count = selection.len(),
            due = selection.iter().filter(|r| r.is_due(now)).count(),
            "scheduler: refresh cycle starting"
        );

        let mut tally = Tally::default();
        for record in &selection {
            let ok = self
                .refresh_record(record.facility_id(), "refresh", Duration::ZERO)
                .await;
            tally.add(ok);
        }

        self.commit().await;
        self.mark_refreshed();

        tracing::info!(
            succeeded = tally.succeeded,
            failed = tally.failed,
            "scheduler: refresh cycle complete"
        );
        RefreshOutcome::Completed {
            succeeded: tally.succeeded,
            failed: tally.failed,
        }
    }

    /// Favourites if any, otherwise the nearest `nearest_count` facilities.
    /// Store read failures yield an empty selection.
    async fn select_cycle_facilities(&self) -> Vec<FacilityRecord> {
        match self.store.fetch_favourites().await {
            Ok(favourites) if !favourites.is_empty() => {
                tracing::debug!(count = favourites.len(), "scheduler: refreshing favourites");
                return favourites;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "scheduler: failed to read favourites");
                return Vec::new();
            }
        }

        match self.store.fetch_all().await {
            Ok(all) => {
                let from = self.location.current_coordinate();
                tracing::debug!(
                    count = self.config.nearest_count,
                    "scheduler: no favourites; refreshing nearest"
                );
                nearest(&all, &from, self.config.nearest_count)
            }
            Err(e) => {
                tracing::error!(error = %e, "scheduler: failed to read facilities");
                Vec::new()
            }
        }
    }
}
