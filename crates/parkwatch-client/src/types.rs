//! Car park API response types.
//!
//! The operator encodes every number as a JSON string (`"spots": "213"`).
//! Fields are kept as delivered and parsed leniently when converting into an
//! [`OccupancySnapshot`]: anything unparsable counts as zero.

use chrono::{DateTime, NaiveDateTime, Utc};
use parkwatch_core::{FacilityInfo, OccupancySnapshot};
use serde::Deserialize;

/// One facility as returned by `GET /carpark?facility={id}`.
///
/// The per-zone breakdown (`zones`) is not read; availability is facility-wide.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiFacility {
    pub facility_id: String,
    pub facility_name: String,
    #[serde(default)]
    pub tsn: String,
    #[serde(default)]
    pub spots: String,
    #[serde(rename = "ParkID", default)]
    pub park_id: String,
    #[serde(default)]
    pub location: ApiLocation,
    #[serde(default)]
    pub occupancy: ApiOccupancy,
    #[serde(rename = "MessageDate", default)]
    pub message_date: String,
    #[serde(default)]
    pub tfnsw_facility_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiLocation {
    #[serde(default)]
    pub suburb: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
}

/// Occupancy counters. Only `total` feeds availability.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiOccupancy {
    #[serde(rename = "loop")]
    pub loop_count: Option<String>,
    pub total: Option<String>,
    pub monthlies: Option<String>,
    pub open_gate: Option<String>,
    pub transients: Option<String>,
}

impl ApiOccupancy {
    #[must_use]
    pub fn occupied(&self) -> u32 {
        self.total.as_deref().map_or(0, parse_count)
    }
}

impl ApiFacility {
    #[must_use]
    pub fn total_spaces(&self) -> u32 {
        parse_count(&self.spots)
    }

    /// `MessageDate` as UTC, or `fetched_at` when absent or unparsable.
    #[must_use]
    pub fn message_at(&self, fetched_at: DateTime<Utc>) -> DateTime<Utc> {
        parse_message_date(&self.message_date).unwrap_or(fetched_at)
    }

    #[must_use]
    pub fn to_facility_info(&self) -> FacilityInfo {
        FacilityInfo {
            facility_id: self.facility_id.clone(),
            name: self.facility_name.clone(),
            suburb: self.location.suburb.clone(),
            address: self.location.address.clone(),
            latitude: parse_float(&self.location.latitude),
            longitude: parse_float(&self.location.longitude),
            total_spaces: self.total_spaces(),
            tsn: self.tsn.clone(),
            tfnsw_facility_id: self.tfnsw_facility_id.clone(),
        }
    }

    #[must_use]
    pub fn into_snapshot(self, fetched_at: DateTime<Utc>) -> OccupancySnapshot {
        OccupancySnapshot {
            total_spaces: self.total_spaces(),
            occupied: self.occupancy.occupied(),
            message_at: self.message_at(fetched_at),
            facility: self.to_facility_info(),
        }
    }
}

fn parse_count(raw: &str) -> u32 {
    raw.trim().parse::<i64>().map_or(0, |n| {
        u32::try_from(n.max(0)).unwrap_or(u32::MAX)
    })
}

fn parse_float(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn parse_message_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
