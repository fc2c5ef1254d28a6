//! Process-wide spacing of outbound occupancy requests.
//!
//! Every fetch, whatever triggered it, first awaits [`RateLimiter::acquire`].
//! The lock is held across the wait, so concurrent callers queue up in
//! arrival order and are released at least `min_interval` apart.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_grant: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// grant, then records this one.
    pub async fn acquire(&self) {
        let mut last = self.last_grant.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tracing::trace!(
                    wait = ?ready_at.saturating_duration_since(Instant::now()),
                    "rate limiter: waiting"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
