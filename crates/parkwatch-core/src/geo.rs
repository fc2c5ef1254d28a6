//! Geographic helpers for ranking facilities by distance.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Sydney CBD, used when there is nothing to average.
pub const SYDNEY_CBD: Coordinate = Coordinate {
    latitude: -33.868_8,
    longitude: 151.209_3,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in kilometres (haversine).
    #[must_use]
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }

    /// Arithmetic mean of `points`, or [`SYDNEY_CBD`] when empty.
    #[must_use]
    pub fn centroid<I>(points: I) -> Coordinate
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let (sum_lat, sum_lon, count) = points
            .into_iter()
            .fold((0.0, 0.0, 0u32), |(lat, lon, n), p| {
                (lat + p.latitude, lon + p.longitude, n + 1)
            });

        if count == 0 {
            return SYDNEY_CBD;
        }

        let n = f64::from(count);
        Coordinate::new(sum_lat / n, sum_lon / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinate::new(-33.757_065, 151.154_662);
        assert!(p.distance_km(&p).abs() < 1e-9);
    }

    #[test]
    fn distance_gordon_to_kiama_is_plausible() {
        let gordon = Coordinate::new(-33.757_065, 151.154_662);
        let kiama = Coordinate::new(-34.673_122, 150.854_546);
        let d = gordon.distance_km(&kiama);
        assert!((100.0..110.0).contains(&d), "unexpected distance {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(-33.0, 151.0);
        let b = Coordinate::new(-34.0, 150.5);
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_empty_is_sydney() {
        assert_eq!(Coordinate::centroid(Vec::new()), SYDNEY_CBD);
    }

    #[test]
    fn centroid_averages_points() {
        let c = Coordinate::centroid(vec![
            Coordinate::new(-33.0, 150.0),
            Coordinate::new(-35.0, 152.0),
        ]);
        assert!((c.latitude - -34.0).abs() < 1e-9);
        assert!((c.longitude - 151.0).abs() < 1e-9);
    }

    #[test]
    fn validity_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
    }
}
