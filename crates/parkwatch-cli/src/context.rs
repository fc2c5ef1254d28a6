//! Shared wiring for every subcommand: config, catalogue, store, location.

use std::sync::Arc;

use parkwatch_client::CarParkClient;
use parkwatch_core::{AppConfig, Catalogue};
use parkwatch_scheduler::{
    load_static_facilities_if_needed, DeviceLocation, Lifecycle, LocationProvider,
    RefreshScheduler, SchedulerConfig, SeedOutcome,
};
use parkwatch_store::{FacilityStore, MemoryStore, StoreError};

/// How a command needs the snapshot store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StoreAccess {
    /// Reads only; works while `parkwatch run` holds the snapshot.
    ReadOnly,
    /// Takes the snapshot's writer lock for the life of the command.
    Exclusive,
}

pub(crate) struct Runtime {
    pub config: AppConfig,
    pub catalogue: Catalogue,
    pub store: Arc<MemoryStore>,
    pub location: Arc<dyn LocationProvider>,
    pub lifecycle: Arc<Lifecycle>,
}

impl Runtime {
    /// Loads the catalogue and opens the snapshot store named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue cannot be read, the snapshot is
    /// unreadable, or another process holds the snapshot for writing.
    pub async fn open(config: AppConfig, access: StoreAccess) -> anyhow::Result<Self> {
        let catalogue = parkwatch_core::load_catalogue(&config.facilities_path)?;

        let path = config.store_path.clone();
        let store = match access {
            StoreAccess::ReadOnly => MemoryStore::open_read_only(path).await?,
            StoreAccess::Exclusive => MemoryStore::open(path).await.map_err(|e| match e {
                StoreError::Locked { .. } => {
                    anyhow::anyhow!("{e}; stop `parkwatch run` before changing the store")
                }
                other => other.into(),
            })?,
        };

        let device = DeviceLocation::new(catalogue.centroid());
        if let Some(coordinate) = config.location_override {
            device.update_fix(coordinate);
            tracing::info!(
                latitude = coordinate.latitude,
                longitude = coordinate.longitude,
                "using configured location"
            );
        }
        let location: Arc<dyn LocationProvider> = Arc::new(device);

        Ok(Self {
            config,
            catalogue,
            store: Arc::new(store),
            location,
            lifecycle: Arc::new(Lifecycle::default()),
        })
    }

    pub fn client(&self) -> anyhow::Result<CarParkClient> {
        CarParkClient::from_config(&self.config)
            .map_err(|e| anyhow::anyhow!("failed to build occupancy client: {e}"))
    }

    pub fn scheduler(&self) -> anyhow::Result<Arc<RefreshScheduler>> {
        let store: Arc<dyn FacilityStore> = self.store.clone();
        Ok(Arc::new(RefreshScheduler::new(
            store,
            Arc::new(self.client()?),
            Arc::clone(&self.location),
            Arc::clone(&self.lifecycle),
            SchedulerConfig::from_app_config(&self.config),
        )))
    }

    pub async fn seed_if_needed(&self) -> anyhow::Result<SeedOutcome> {
        let outcome = load_static_facilities_if_needed(
            self.store.as_ref(),
            &self.catalogue,
            self.location.as_ref(),
        )
        .await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use parkwatch_core::{Coordinate, Environment};

    use super::*;

    const CATALOGUE: &str = r#"
facilities:
  - facility_id: "6"
    name: "Park&Ride - Gordon Henry St (north)"
    latitude: -33.757065
    longitude: 151.154662
    total_spaces: 213
  - facility_id: "7"
    name: "Park&Ride - Kiama"
    latitude: -34.673122
    longitude: 150.854546
    total_spaces: 42
"#;

    fn config(dir: &Path, location_override: Option<Coordinate>) -> AppConfig {
        let facilities_path = dir.join("facilities.yaml");
        std::fs::write(&facilities_path, CATALOGUE).unwrap();
        AppConfig {
            env: Environment::Test,
            api_key: "test-key".to_string(),
            base_url: "https://api.transport.nsw.gov.au/v1".to_string(),
            log_level: "info".to_string(),
            facilities_path,
            store_path: dir.join("data").join("facilities.json"),
            request_timeout_secs: 5,
            user_agent: "parkwatch-test".to_string(),
            min_api_interval_ms: 500,
            remaining_delay_ms: 1_000,
            nearest_count: 5,
            foreground_tick_secs: 30,
            background_tick_secs: 300,
            location_override,
        }
    }

    #[tokio::test]
    async fn exclusive_runtime_seeds_and_builds_scheduler() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Runtime::open(config(dir.path(), None), StoreAccess::Exclusive)
            .await
            .unwrap();

        assert_eq!(
            runtime.seed_if_needed().await.unwrap(),
            SeedOutcome::Seeded { inserted: 2 }
        );
        let scheduler = runtime.scheduler().unwrap();
        assert!(!scheduler.is_refreshing());
        assert_eq!(runtime.location.current_coordinate(), runtime.catalogue.centroid());
    }

    #[tokio::test]
    async fn configured_location_becomes_the_device_fix() {
        let dir = tempfile::tempdir().unwrap();
        let kiama = Coordinate::new(-34.673_122, 150.854_546);
        let runtime = Runtime::open(config(dir.path(), Some(kiama)), StoreAccess::ReadOnly)
            .await
            .unwrap();
        assert_eq!(runtime.location.current_coordinate(), kiama);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn second_writer_is_told_to_stop_the_daemon() {
        let dir = tempfile::tempdir().unwrap();
        let first = Runtime::open(config(dir.path(), None), StoreAccess::Exclusive)
            .await
            .unwrap();

        let err = Runtime::open(config(dir.path(), None), StoreAccess::Exclusive)
            .await
            .err()
            .expect("snapshot should be locked");
        assert!(err.to_string().contains("stop `parkwatch run`"), "got {err}");

        assert!(Runtime::open(config(dir.path(), None), StoreAccess::ReadOnly)
            .await
            .is_ok());
        drop(first);
    }
}
