//! Published progress and counters consumed by the presentation layer.

use chrono::{DateTime, Utc};

/// Phase of the one-time priority-ordered initial load.
///
/// Moves strictly forward within one load: favourites, nearest, remaining,
/// then completed. `(current, total)` counts facilities within the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialLoadProgress {
    #[default]
    NotStarted,
    LoadingFavourites(usize, usize),
    LoadingNearest(usize, usize),
    LoadingRemaining(usize, usize),
    Completed,
}

impl InitialLoadProgress {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !matches!(
            self,
            InitialLoadProgress::NotStarted | InitialLoadProgress::Completed
        )
    }

    /// Ordinal of the phase, for forward-only checks.
    #[must_use]
    pub fn phase_index(&self) -> u8 {
        match self {
            InitialLoadProgress::NotStarted => 0,
            InitialLoadProgress::LoadingFavourites(..) => 1,
            InitialLoadProgress::LoadingNearest(..) => 2,
            InitialLoadProgress::LoadingRemaining(..) => 3,
            InitialLoadProgress::Completed => 4,
        }
    }

    /// Overall completion in `0.0..=1.0`.
    ///
    /// Favourites and nearest weigh 30% each, remaining 40%.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        fn part(current: usize, total: usize, weight: f64) -> f64 {
            if total == 0 {
                weight
            } else {
                current as f64 / total as f64 * weight
            }
        }

        match *self {
            InitialLoadProgress::NotStarted => 0.0,
            InitialLoadProgress::LoadingFavourites(c, t) => part(c, t, 0.3),
            InitialLoadProgress::LoadingNearest(c, t) => 0.3 + part(c, t, 0.3),
            InitialLoadProgress::LoadingRemaining(c, t) => 0.6 + part(c, t, 0.4),
            InitialLoadProgress::Completed => 1.0,
        }
    }
}

impl std::fmt::Display for InitialLoadProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitialLoadProgress::NotStarted => write!(f, "Ready to load"),
            InitialLoadProgress::LoadingFavourites(c, t) => {
                write!(f, "Loading favourites ({c}/{t})")
            }
            InitialLoadProgress::LoadingNearest(c, t) => write!(f, "Loading nearest ({c}/{t})"),
            InitialLoadProgress::LoadingRemaining(c, t) => {
                write!(f, "Loading remaining ({c}/{t})")
            }
            InitialLoadProgress::Completed => write!(f, "All data loaded"),
        }
    }
}

/// Process-wide fetch counters. Reset only by restarting the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshStats {
    pub success_count: u64,
    pub failure_count: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl RefreshStats {
    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.success_count = self.success_count.saturating_add(1);
        self.last_success_at = Some(now);
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_at = Some(now);
    }

    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.success_count.saturating_add(self.failure_count)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        let total = self.attempts();
        if total == 0 {
            0.0
        } else {
            self.success_count as f64 / total as f64
        }
    }
}

impl std::fmt::Display for RefreshStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} success, {} failed",
            self.success_count, self.failure_count
        )
    }
}

/// Store-wide summary for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FacilityStats {
    pub total_count: usize,
    pub with_occupancy_data: usize,
    pub favourite_count: usize,
}

impl FacilityStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn occupancy_data_percentage(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.with_occupancy_data as f64 / self.total_count as f64 * 100.0
        }
    }
}

impl std::fmt::Display for FacilityStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} facilities, {} with data ({:.0}%), {} favourites",
            self.total_count,
            self.with_occupancy_data,
            self.occupancy_data_percentage(),
            self.favourite_count
        )
    }
}
