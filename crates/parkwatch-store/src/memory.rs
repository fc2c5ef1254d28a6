//! In-memory [`FacilityStore`] with an optional JSON snapshot on disk.
//!
//! Records keep insertion order. With a snapshot path the file is loaded at
//! [`MemoryStore::open`] and rewritten on every [`FacilityStore::commit`]
//! that follows a mutation. Writes go to a sibling temp file which is then
//! renamed over the target, so a crash mid-write leaves the previous
//! snapshot intact.
//!
//! A writable store holds an exclusive lock on `<snapshot>.lock` until it is
//! dropped; a second writer on the same path fails with
//! [`StoreError::Locked`]. [`MemoryStore::open_read_only`] takes no lock and
//! refuses to commit.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkwatch_core::{FacilityRecord, FacilityStats};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::lock::SnapshotLock;
use crate::{compute_stats, FacilityStore, StoreError};

#[derive(Serialize)]
struct SnapshotOut<'a> {
    saved_at: DateTime<Utc>,
    records: &'a [FacilityRecord],
}

#[derive(Deserialize)]
struct SnapshotIn {
    records: Vec<FacilityRecord>,
}

#[derive(Default)]
struct WorkingSet {
    records: Vec<FacilityRecord>,
    dirty: bool,
}

impl WorkingSet {
    fn position(&self, facility_id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.facility_id() == facility_id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<WorkingSet>,
    snapshot_path: Option<PathBuf>,
    read_only: bool,
    _lock: Option<SnapshotLock>,
}

impl MemoryStore {
    /// A store that lives only in memory; `commit` just clears the dirty flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `records`, in order, already committed.
    #[must_use]
    pub fn with_records(records: Vec<FacilityRecord>) -> Self {
        Self {
            inner: RwLock::new(WorkingSet {
                records,
                dirty: false,
            }),
            ..Self::default()
        }
    }

    /// Opens a store backed by the JSON snapshot at `path` for writing.
    ///
    /// A missing file yields an empty store; the file is created on the
    /// first commit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Locked`] if another writer holds the snapshot,
    /// [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Serialize`] if it is not a valid snapshot.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let lock = SnapshotLock::acquire(&path)?;
        let records = read_snapshot(&path).await?;
        Ok(Self {
            inner: RwLock::new(WorkingSet {
                records,
                dirty: false,
            }),
            snapshot_path: Some(path),
            read_only: false,
            _lock: Some(lock),
        })
    }

    /// Opens the snapshot at `path` without taking the writer lock.
    ///
    /// Reads see the file as it was at open time. Mutations stay in memory;
    /// committing them fails with [`StoreError::ReadOnly`].
    ///
    /// # Errors
    ///
    /// Same as [`MemoryStore::open`], except it never returns
    /// [`StoreError::Locked`].
    pub async fn open_read_only(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = read_snapshot(&path).await?;
        Ok(Self {
            inner: RwLock::new(WorkingSet {
                records,
                dirty: false,
            }),
            snapshot_path: Some(path),
            read_only: true,
            _lock: None,
        })
    }

    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// `true` when the working set has mutations not yet committed.
    pub async fn has_pending_changes(&self) -> bool {
        self.inner.read().await.dirty
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

async fn read_snapshot(path: &Path) -> Result<Vec<FacilityRecord>, StoreError> {
    let records = match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice::<SnapshotIn>(&bytes)?.records,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    tracing::debug!(
        path = %path.display(),
        count = records.len(),
        "store: opened snapshot"
    );
    Ok(records)
}

async fn write_snapshot(path: &Path, records: &[FacilityRecord]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let body = serde_json::to_vec_pretty(&SnapshotOut {
        saved_at: Utc::now(),
        records,
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, body).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

#[async_trait]
impl FacilityStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<FacilityRecord>, StoreError> {
        Ok(self.inner.read().await.records.clone())
    }

    async fn fetch_favourites(&self) -> Result<Vec<FacilityRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .records
            .iter()
            .filter(|r| r.is_favourite())
            .cloned()
            .collect())
    }

    async fn get(&self, facility_id: &str) -> Result<Option<FacilityRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .records
            .iter()
            .find(|r| r.facility_id() == facility_id)
            .cloned())
    }

    async fn insert(&self, record: FacilityRecord) -> Result<(), StoreError> {
        let mut set = self.inner.write().await;
        match set.position(record.facility_id()) {
            Some(idx) => set.records[idx] = record,
            None => set.records.push(record),
        }
        set.dirty = true;
        Ok(())
    }

    async fn update(&self, record: FacilityRecord) -> Result<(), StoreError> {
        let mut set = self.inner.write().await;
        let idx = set
            .position(record.facility_id())
            .ok_or_else(|| StoreError::NotFound(record.facility_id().to_string()))?;
        set.records[idx] = record;
        set.dirty = true;
        Ok(())
    }

    async fn modify(
        &self,
        facility_id: &str,
        apply: &(dyn for<'a> Fn(&'a mut FacilityRecord) + Sync),
    ) -> Result<FacilityRecord, StoreError> {
        let mut set = self.inner.write().await;
        let idx = set
            .position(facility_id)
            .ok_or_else(|| StoreError::NotFound(facility_id.to_string()))?;
        apply(&mut set.records[idx]);
        set.dirty = true;
        Ok(set.records[idx].clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut set = self.inner.write().await;
        set.records.clear();
        set.dirty = true;
        Ok(())
    }

    async fn commit(&self) -> Result<(), StoreError> {
        let mut set = self.inner.write().await;
        if !set.dirty {
            return Ok(());
        }
        if let Some(path) = &self.snapshot_path {
            if self.read_only {
                return Err(StoreError::ReadOnly { path: path.clone() });
            }
            write_snapshot(path, &set.records).await?;
            tracing::debug!(
                path = %path.display(),
                count = set.records.len(),
                "store: snapshot written"
            );
        }
        set.dirty = false;
        Ok(())
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<FacilityStats, StoreError> {
        Ok(compute_stats(&self.inner.read().await.records, now))
    }
}
