use std::time::Duration;

use super::RefreshScheduler;

/// Per-run success and failure counts.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct Tally {
    pub succeeded: usize,
    pub failed: usize,
}

impl Tally {
    pub fn add(&mut self, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

impl RefreshScheduler {
    /// Fetches one facility through the rate limiter and applies the result
    /// to the record as it stands in the store after the fetch. Returns
    /// `true` on success.
    ///
    /// Never fails: client and store errors are logged and counted. The
    /// store is not committed here.
    pub(super) async fn refresh_record(
        &self,
        facility_id: &str,
        phase: &'static str,
        extra_delay: Duration,
    ) -> bool {
        self.limiter.acquire().await;

        let result = self.client.fetch(facility_id).await;
        let now = self.clock.now();

        let ok = match result {
            Ok(snapshot) => {
                let state = self.lifecycle.current();
                self.state_tx
                    .send_modify(|s| s.stats.record_success(now));
                match self
                    .store
                    .modify(facility_id, &|r| r.record_success(&snapshot, state, now))
                    .await
                {
                    Ok(record) => tracing::info!(
                        facility_id,
                        phase,
                        available = ?record.available_spots(now),
                        total = record.info.total_spaces,
                        "scheduler: occupancy refreshed"
                    ),
                    Err(e) => tracing::error!(
                        facility_id,
                        phase,
                        error = %e,
                        "scheduler: failed to stage record update"
                    ),
                }
                true
            }
            Err(e) => {
                self.state_tx
                    .send_modify(|s| s.stats.record_failure(now));
                let failures = match self
                    .store
                    .modify(facility_id, &|r| r.record_failure(now))
                    .await
                {
                    Ok(record) => record.consecutive_failures(),
                    Err(store_err) => {
                        tracing::error!(
                            facility_id,
                            phase,
                            error = %store_err,
                            "scheduler: failed to stage record update"
                        );
                        0
                    }
                };
                tracing::warn!(
                    facility_id,
                    phase,
                    kind = e.kind(),
                    failures,
                    error = %e,
                    "scheduler: occupancy fetch failed"
                );
                false
            }
        };

        if !extra_delay.is_zero() {
            tokio::time::sleep(extra_delay).await;
        }

        ok
    }
}
