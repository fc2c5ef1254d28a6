use std::time::Duration;

use parkwatch_core::FacilityRecord;

use super::{RefreshOutcome, RefreshScheduler};

impl RefreshScheduler {
    /// Force-refreshes one facility outside the perpetual cycle and commits
    /// immediately. Skipped if another run is in progress.
    pub async fn refresh_single_facility(&self, facility_id: &str) -> RefreshOutcome {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!(facility_id, "scheduler: single refresh skipped; already refreshing");
            return RefreshOutcome::Skipped;
        };

        if self.lookup(facility_id).await.is_none() {
            return RefreshOutcome::NotFound;
        }

        tracing::info!(facility_id, "scheduler: force refreshing facility");
        let ok = self
            .refresh_record(facility_id, "detail", Duration::ZERO)
            .await;

        self.commit().await;
        self.mark_refreshed();

        RefreshOutcome::Completed {
            succeeded: usize::from(ok),
            failed: usize::from(!ok),
        }
    }

    /// Refreshes one facility only if its reading is missing, expired, or
    /// older than the configured detail staleness.
    pub async fn refresh_facility_if_needed(&self, facility_id: &str) -> RefreshOutcome {
        let Some(record) = self.lookup(facility_id).await else {
            return RefreshOutcome::NotFound;
        };

        let now = self.clock.now();
        let age = record.time_since_last_refresh(now);
        if age <= self.config.detail_staleness && record.is_occupancy_cache_valid(now) {
            tracing::debug!(facility_id, age = ?age, "scheduler: reading is fresh");
            return RefreshOutcome::UpToDate;
        }

        self.refresh_single_facility(facility_id).await
    }

    async fn lookup(&self, facility_id: &str) -> Option<FacilityRecord> {
        match self.store.get(facility_id).await {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                tracing::warn!(facility_id, "scheduler: unknown facility");
                None
            }
            Err(e) => {
                tracing::error!(facility_id, error = %e, "scheduler: failed to read facility");
                None
            }
        }
    }
}
