use std::time::Duration;

use parkwatch_core::{AppConfig, AppState};

/// Detail views refresh a facility when its reading is older than this.
pub const DEFAULT_DETAIL_STALENESS: Duration = Duration::from_secs(30);

/// Timing and batch-size knobs for [`crate::RefreshScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Minimum spacing between any two outbound requests.
    pub min_api_interval: Duration,
    /// Extra pause after each fetch in the initial load's last phase.
    pub remaining_delay: Duration,
    /// How many nearest facilities the initial load and fallback cycle cover.
    pub nearest_count: usize,
    pub foreground_tick: Duration,
    pub background_tick: Duration,
    pub detail_staleness: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_api_interval: Duration::from_millis(500),
            remaining_delay: Duration::from_millis(1_000),
            nearest_count: 5,
            foreground_tick: AppState::Active.refresh_interval(),
            background_tick: AppState::Background.refresh_interval(),
            detail_staleness: DEFAULT_DETAIL_STALENESS,
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            min_api_interval: Duration::from_millis(config.min_api_interval_ms),
            remaining_delay: Duration::from_millis(config.remaining_delay_ms),
            nearest_count: config.nearest_count,
            foreground_tick: Duration::from_secs(config.foreground_tick_secs),
            background_tick: Duration::from_secs(config.background_tick_secs),
            detail_staleness: DEFAULT_DETAIL_STALENESS,
        }
    }

    /// Sleep between perpetual cycles for the given lifecycle state.
    #[must_use]
    pub fn tick_interval(&self, state: AppState) -> Duration {
        match state {
            AppState::Active => self.foreground_tick,
            AppState::Background => self.background_tick,
        }
    }
}
