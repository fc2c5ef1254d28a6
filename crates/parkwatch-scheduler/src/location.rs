//! Device position used to rank facilities by distance.

use std::sync::{PoisonError, RwLock};

use parkwatch_core::{Coordinate, FacilityRecord};

/// A new fix replaces the current one only beyond this distance.
pub const SIGNIFICANT_MOVE_KM: f64 = 0.1;

/// Best-effort current position. Never fails; implementations fall back to
/// a default coordinate when no fix is available.
pub trait LocationProvider: Send + Sync {
    fn current_coordinate(&self) -> Coordinate;
}

/// Always reports the same coordinate.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

impl LocationProvider for FixedLocation {
    fn current_coordinate(&self) -> Coordinate {
        self.0
    }
}

/// Last known device fix, with a fallback (usually the catalogue centroid).
#[derive(Debug)]
pub struct DeviceLocation {
    fallback: Coordinate,
    fix: RwLock<Option<Coordinate>>,
}

impl DeviceLocation {
    #[must_use]
    pub fn new(fallback: Coordinate) -> Self {
        Self {
            fallback,
            fix: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn fallback(&self) -> Coordinate {
        self.fallback
    }

    #[must_use]
    pub fn has_fix(&self) -> bool {
        self.fix.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Offers a new fix. Returns `true` if it replaced the current one.
    ///
    /// Out-of-range coordinates are ignored, as are moves of
    /// [`SIGNIFICANT_MOVE_KM`] or less.
    pub fn update_fix(&self, candidate: Coordinate) -> bool {
        if !candidate.is_valid() {
            tracing::warn!(
                latitude = candidate.latitude,
                longitude = candidate.longitude,
                "location: ignoring out-of-range fix"
            );
            return false;
        }

        let mut fix = self.fix.write().unwrap_or_else(PoisonError::into_inner);
        let moved =
            !fix.is_some_and(|current| current.distance_km(&candidate) <= SIGNIFICANT_MOVE_KM);
        if moved {
            *fix = Some(candidate);
        }
        moved
    }

    pub fn clear_fix(&self) {
        *self.fix.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl LocationProvider for DeviceLocation {
    fn current_coordinate(&self) -> Coordinate {
        self.fix
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or(self.fallback)
    }
}

/// Sorts `records` nearest-first from `from`. Ties keep their order.
pub fn sort_by_distance(records: &mut [FacilityRecord], from: &Coordinate) {
    records.sort_by(|a, b| a.distance_km(from).total_cmp(&b.distance_km(from)));
}

/// The `limit` records nearest to `from`, nearest-first.
#[must_use]
pub fn nearest(records: &[FacilityRecord], from: &Coordinate, limit: usize) -> Vec<FacilityRecord> {
    let mut sorted = records.to_vec();
    sort_by_distance(&mut sorted, from);
    sorted.truncate(limit);
    sorted
}
