//! Per-facility refresh state and the policy that drives it.
//!
//! A [`FacilityRecord`] owns three independent clocks:
//!
//! - the **occupancy cache**, valid for [`OCCUPANCY_CACHE_VALIDITY`] after the
//!   last successful fetch, after which reads report "no data";
//! - the **success cadence**, `next_scheduled_refresh_at` computed from the
//!   facility's [`CadenceGroup`], favourite status, and [`AppState`];
//! - the **failure backoff**, `min(120 × 2^failures, 1800)` seconds, which
//!   replaces the success cadence whenever a fetch fails.
//!
//! The two scheduling formulas are [`FacilityRecord::success_interval`] and
//! [`failure_backoff`]; a failure never consults the former.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::facilities::{CadenceAllowList, FacilityInfo};
use crate::geo::Coordinate;

/// How long a successful occupancy reading stays presentable.
pub const OCCUPANCY_CACHE_VALIDITY: Duration = Duration::from_secs(15 * 60);

const FAILURE_BACKOFF_BASE_SECS: u64 = 120;
const FAILURE_BACKOFF_CAP_SECS: u64 = 1_800;
const MAX_SUCCESS_BACKOFF_EXPONENT: u32 = 4;

/// Foreground / background operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    #[default]
    Active,
    Background,
}

impl AppState {
    /// Spacing between perpetual refresh cycles.
    #[must_use]
    pub const fn refresh_interval(self) -> Duration {
        match self {
            AppState::Active => Duration::from_secs(30),
            AppState::Background => Duration::from_secs(300),
        }
    }
}

impl std::fmt::Display for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppState::Active => write!(f, "active"),
            AppState::Background => write!(f, "background"),
        }
    }
}

/// Static refresh-frequency classification, fixed at record creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadenceGroup {
    High,
    Standard,
}

impl CadenceGroup {
    #[must_use]
    pub const fn active_interval(self) -> Duration {
        match self {
            CadenceGroup::High => Duration::from_secs(15),
            CadenceGroup::Standard => Duration::from_secs(60),
        }
    }

    #[must_use]
    pub const fn background_interval(self) -> Duration {
        match self {
            CadenceGroup::High => Duration::from_secs(300),
            CadenceGroup::Standard => Duration::from_secs(600),
        }
    }

    #[must_use]
    pub const fn interval_for(self, state: AppState) -> Duration {
        match state {
            AppState::Active => self.active_interval(),
            AppState::Background => self.background_interval(),
        }
    }
}

impl std::fmt::Display for CadenceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            CadenceGroup::High => "high",
            CadenceGroup::Standard => "standard",
        })
    }
}

/// Occupancy status shown to users, derived on demand.
///
/// Thresholds follow the operator's guidance: full below one free space,
/// almost full below 10% of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityStatus {
    Available,
    AlmostFull,
    Full,
    NoData,
}

impl AvailabilityStatus {
    #[must_use]
    pub fn from_counts(available: Option<u32>, total_spaces: u32) -> Self {
        match available {
            None => AvailabilityStatus::NoData,
            Some(0) => AvailabilityStatus::Full,
            Some(spots) if spots < total_spaces / 10 => AvailabilityStatus::AlmostFull,
            Some(_) => AvailabilityStatus::Available,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "Available",
            AvailabilityStatus::AlmostFull => "Almost Full",
            AvailabilityStatus::Full => "Full",
            AvailabilityStatus::NoData => "No Data",
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// One successful occupancy reading returned by the remote API.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancySnapshot {
    pub total_spaces: u32,
    pub occupied: u32,
    pub message_at: DateTime<Utc>,
    pub facility: FacilityInfo,
}

impl OccupancySnapshot {
    #[must_use]
    pub fn available_spots(&self) -> u32 {
        self.total_spaces.saturating_sub(self.occupied)
    }
}

/// Backoff applied after `consecutive_failures` failed fetches in a row.
///
/// `min(120 × 2^f, 1800)` seconds.
#[must_use]
pub fn failure_backoff(consecutive_failures: u32) -> Duration {
    let factor = 1u64 << consecutive_failures.min(16);
    let secs = FAILURE_BACKOFF_BASE_SECS
        .saturating_mul(factor)
        .min(FAILURE_BACKOFF_CAP_SECS);
    Duration::from_secs(secs)
}

fn add_duration(at: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(delay)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// The Unix epoch; a record scheduled here is due immediately.
fn far_past() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// A tracked facility together with its occupancy cache and refresh
/// bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub info: FacilityInfo,
    is_favourite: bool,
    last_visited: Option<DateTime<Utc>>,
    cadence: CadenceGroup,
    cached_occupied: Option<u32>,
    cached_at: Option<DateTime<Utc>>,
    last_message_at: Option<DateTime<Utc>>,
    last_refreshed_at: Option<DateTime<Utc>>,
    #[serde(default = "far_past")]
    next_scheduled_refresh_at: DateTime<Utc>,
    consecutive_failures: u32,
    last_failure_at: Option<DateTime<Utc>>,
}

impl FacilityRecord {
    /// Creates a record with no occupancy data; it is due immediately.
    #[must_use]
    pub fn new(info: FacilityInfo, cadence: CadenceGroup) -> Self {
        Self {
            info,
            is_favourite: false,
            last_visited: None,
            cadence,
            cached_occupied: None,
            cached_at: None,
            last_message_at: None,
            last_refreshed_at: None,
            next_scheduled_refresh_at: far_past(),
            consecutive_failures: 0,
            last_failure_at: None,
        }
    }

    /// Creates a record and classifies its cadence from `allow_list`.
    #[must_use]
    pub fn from_catalogue(info: FacilityInfo, allow_list: &CadenceAllowList) -> Self {
        let cadence = allow_list.classify(&info.name);
        Self::new(info, cadence)
    }

    #[must_use]
    pub fn facility_id(&self) -> &str {
        &self.info.facility_id
    }

    #[must_use]
    pub fn cadence(&self) -> CadenceGroup {
        self.cadence
    }

    #[must_use]
    pub fn is_favourite(&self) -> bool {
        self.is_favourite
    }

    pub fn set_favourite(&mut self, favourite: bool) {
        self.is_favourite = favourite;
    }

    #[must_use]
    pub fn last_visited(&self) -> Option<DateTime<Utc>> {
        self.last_visited
    }

    pub fn mark_visited(&mut self, now: DateTime<Utc>) {
        self.last_visited = Some(now);
    }

    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    #[must_use]
    pub fn last_failure_at(&self) -> Option<DateTime<Utc>> {
        self.last_failure_at
    }

    #[must_use]
    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed_at
    }

    #[must_use]
    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.last_message_at
    }

    #[must_use]
    pub fn next_scheduled_refresh_at(&self) -> DateTime<Utc> {
        self.next_scheduled_refresh_at
    }

    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        self.info.coordinate()
    }

    #[must_use]
    pub fn distance_km(&self, from: &Coordinate) -> f64 {
        from.distance_km(&self.coordinate())
    }

    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_scheduled_refresh_at
    }

    /// `true` while the last successful reading is younger than
    /// [`OCCUPANCY_CACHE_VALIDITY`].
    #[must_use]
    pub fn is_occupancy_cache_valid(&self, now: DateTime<Utc>) -> bool {
        let Some(cached_at) = self.cached_at else {
            return false;
        };
        if self.cached_occupied.is_none() {
            return false;
        }
        match (now - cached_at).to_std() {
            Ok(age) => age < OCCUPANCY_CACHE_VALIDITY,
            // Cached "in the future" relative to `now`: still fresh.
            Err(_) => true,
        }
    }

    /// Free spaces, or `None` when there is no valid reading.
    #[must_use]
    pub fn available_spots(&self, now: DateTime<Utc>) -> Option<u32> {
        if !self.is_occupancy_cache_valid(now) {
            return None;
        }
        self.cached_occupied
            .map(|occupied| self.info.total_spaces.saturating_sub(occupied))
    }

    #[must_use]
    pub fn availability_status(&self, now: DateTime<Utc>) -> AvailabilityStatus {
        AvailabilityStatus::from_counts(self.available_spots(now), self.info.total_spaces)
    }

    /// Time since the last successful refresh; [`Duration::MAX`] if never.
    #[must_use]
    pub fn time_since_last_refresh(&self, now: DateTime<Utc>) -> Duration {
        self.last_refreshed_at
            .map_or(Duration::MAX, |at| (now - at).to_std().unwrap_or_default())
    }

    /// Interval until the next refresh on the success path.
    #[must_use]
    pub fn success_interval(&self, state: AppState) -> Duration {
        let mut interval = self.cadence.interval_for(state);
        if self.is_favourite {
            interval /= 2;
        }
        if self.consecutive_failures > 0 {
            let exponent = self.consecutive_failures.min(MAX_SUCCESS_BACKOFF_EXPONENT);
            interval = interval.saturating_mul(1 << exponent);
        }
        interval
    }

    /// Applies a successful fetch.
    pub fn record_success(
        &mut self,
        snapshot: &OccupancySnapshot,
        state: AppState,
        now: DateTime<Utc>,
    ) {
        self.consecutive_failures = 0;
        self.last_failure_at = None;

        if snapshot.total_spaces > 0 {
            self.info.total_spaces = snapshot.total_spaces;
        }
        self.cached_occupied = Some(snapshot.occupied);
        self.cached_at = Some(now);
        self.last_message_at = Some(snapshot.message_at);
        self.last_refreshed_at = Some(now);

        self.next_scheduled_refresh_at = add_duration(now, self.success_interval(state));
    }

    /// Applies a failed fetch. The occupancy cache is left to age out.
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure_at = Some(now);
        self.next_scheduled_refresh_at =
            add_duration(now, failure_backoff(self.consecutive_failures));
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
