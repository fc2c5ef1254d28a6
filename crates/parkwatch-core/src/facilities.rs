use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::record::CadenceGroup;
use crate::ConfigError;

/// Prefix the operator puts in front of every commuter car park name.
const PARK_AND_RIDE_PREFIX: &str = "Park&Ride - ";

/// Static metadata for one parking facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityInfo {
    pub facility_id: String,
    pub name: String,
    #[serde(default)]
    pub suburb: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_spaces: u32,
    #[serde(default)]
    pub tsn: String,
    #[serde(default)]
    pub tfnsw_facility_id: String,
}

impl FacilityInfo {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Name without the operator's `Park&Ride - ` prefix.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .strip_prefix(PARK_AND_RIDE_PREFIX)
            .unwrap_or(&self.name)
    }
}

/// Name fragments that put a facility in the [`CadenceGroup::High`] group.
///
/// Matching is case-insensitive substring matching on the facility name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CadenceAllowList(Vec<String>);

impl CadenceAllowList {
    #[must_use]
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|s| s.into().to_lowercase())
                .filter(|s| !s.trim().is_empty())
                .collect(),
        )
    }

    #[must_use]
    pub fn classify(&self, name: &str) -> CadenceGroup {
        let lower = name.to_lowercase();
        // Entries read from YAML skip `new`, so normalise here as well.
        if self
            .0
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .any(|entry| lower.contains(&entry.to_lowercase()))
        {
            CadenceGroup::High
        } else {
            CadenceGroup::Standard
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Contents of the facility catalogue YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalogue {
    #[serde(default)]
    pub high_cadence: CadenceAllowList,
    pub facilities: Vec<FacilityInfo>,
}

impl Catalogue {
    /// Centre of every catalogue facility; the fallback device position.
    #[must_use]
    pub fn centroid(&self) -> Coordinate {
        Coordinate::centroid(self.facilities.iter().map(FacilityInfo::coordinate))
    }
}

/// Load and validate the facility catalogue from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalogue(path: &Path) -> Result<Catalogue, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogueIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_catalogue(&content)
}

/// Parse and validate catalogue YAML.
///
/// # Errors
///
/// Returns [`ConfigError::CatalogueParse`] for malformed YAML and
/// [`ConfigError::Validation`] for semantically invalid entries.
pub fn parse_catalogue(content: &str) -> Result<Catalogue, ConfigError> {
    let catalogue: Catalogue =
        serde_yaml::from_str(content).map_err(ConfigError::CatalogueParse)?;
    validate_catalogue(&catalogue)?;
    Ok(catalogue)
}

fn validate_catalogue(catalogue: &Catalogue) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for facility in &catalogue.facilities {
        if facility.facility_id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "facility '{}' has an empty facility_id",
                facility.name
            )));
        }

        if facility.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "facility {} has an empty name",
                facility.facility_id
            )));
        }

        if !facility.coordinate().is_valid() {
            return Err(ConfigError::Validation(format!(
                "facility {} has out-of-range coordinates ({}, {})",
                facility.facility_id, facility.latitude, facility.longitude
            )));
        }

        if !seen_ids.insert(facility.facility_id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate facility_id: '{}'",
                facility.facility_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "facilities_test.rs"]
mod tests;
