use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkwatch_core::{FacilityRecord, FacilityStats};
use thiserror::Error;

mod lock;
pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store snapshot could not be (de)serialized: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("facility {0} not found")]
    NotFound(String),
    #[error("snapshot {path} is in use by another parkwatch process")]
    Locked { path: PathBuf },
    #[error("store was opened read-only; cannot write {path}")]
    ReadOnly { path: PathBuf },
}

/// Keyed record store with an explicit commit.
///
/// Mutations land in a working set and become durable only on
/// [`FacilityStore::commit`]; callers batch commits per refresh run.
#[async_trait]
pub trait FacilityStore: Send + Sync {
    /// Every record, in store order.
    async fn fetch_all(&self) -> Result<Vec<FacilityRecord>, StoreError>;

    /// Favourite records, in store order.
    async fn fetch_favourites(&self) -> Result<Vec<FacilityRecord>, StoreError>;

    async fn get(&self, facility_id: &str) -> Result<Option<FacilityRecord>, StoreError>;

    /// Adds a record, replacing any existing record with the same id in place.
    async fn insert(&self, record: FacilityRecord) -> Result<(), StoreError>;

    /// Replaces an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record has this id.
    async fn update(&self, record: FacilityRecord) -> Result<(), StoreError>;

    /// Applies `apply` to the stored record in place and returns the result.
    ///
    /// The read and the write happen under one lock, so fields `apply` does
    /// not touch keep whatever value they hold at that moment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record has this id.
    async fn modify(
        &self,
        facility_id: &str,
        apply: &(dyn for<'a> Fn(&'a mut FacilityRecord) + Sync),
    ) -> Result<FacilityRecord, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;

    async fn commit(&self) -> Result<(), StoreError>;

    async fn stats(&self, now: DateTime<Utc>) -> Result<FacilityStats, StoreError>;
}

/// Computes [`FacilityStats`] over a slice of records.
#[must_use]
pub fn compute_stats(records: &[FacilityRecord], now: DateTime<Utc>) -> FacilityStats {
    FacilityStats {
        total_count: records.len(),
        with_occupancy_data: records
            .iter()
            .filter(|r| r.is_occupancy_cache_valid(now))
            .count(),
        favourite_count: records.iter().filter(|r| r.is_favourite()).count(),
    }
}
