use parkwatch_core::{Catalogue, FacilityRecord};
use parkwatch_store::{FacilityStore, StoreError};

use crate::location::{sort_by_distance, LocationProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store already had records; nothing was written.
    AlreadySeeded { existing: usize },
    Seeded { inserted: usize },
}

/// Populate an empty store from the static catalogue.
///
/// Records are inserted nearest-first from the current location, without
/// occupancy data, with cadence classified from the catalogue's allow-list,
/// and committed once. A store that already holds records is left untouched.
///
/// # Errors
///
/// Returns [`StoreError`] if reading, inserting, or committing fails.
pub async fn load_static_facilities_if_needed(
    store: &dyn FacilityStore,
    catalogue: &Catalogue,
    location: &dyn LocationProvider,
) -> Result<SeedOutcome, StoreError> {
    let existing = store.fetch_all().await?.len();
    if existing > 0 {
        tracing::debug!(existing, "seed: store already populated; skipping");
        return Ok(SeedOutcome::AlreadySeeded { existing });
    }

    let mut records: Vec<FacilityRecord> = catalogue
        .facilities
        .iter()
        .cloned()
        .map(|info| FacilityRecord::from_catalogue(info, &catalogue.high_cadence))
        .collect();
    sort_by_distance(&mut records, &location.current_coordinate());

    let inserted = records.len();
    for record in records {
        store.insert(record).await?;
    }
    store.commit().await?;

    tracing::info!(inserted, "seed: loaded static facilities");
    Ok(SeedOutcome::Seeded { inserted })
}

/// Clear the store and seed it again from the catalogue.
///
/// Drops every favourite flag, occupancy reading, and failure counter.
///
/// # Errors
///
/// Returns [`StoreError`] if clearing or seeding fails.
pub async fn reload_static_facilities(
    store: &dyn FacilityStore,
    catalogue: &Catalogue,
    location: &dyn LocationProvider,
) -> Result<SeedOutcome, StoreError> {
    store.clear().await?;
    tracing::info!("seed: store cleared for reload");
    load_static_facilities_if_needed(store, catalogue, location).await
}
