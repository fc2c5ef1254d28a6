pub mod client;
pub mod error;
pub mod types;

use std::collections::BTreeMap;

use async_trait::async_trait;
use parkwatch_core::OccupancySnapshot;

pub use client::{exclude_historical, CarParkClient};
pub use error::OccupancyError;
pub use types::{ApiFacility, ApiLocation, ApiOccupancy};

/// Remote source of live occupancy readings.
///
/// The scheduler only sees this trait; tests substitute scripted fakes.
#[async_trait]
pub trait OccupancyClient: Send + Sync {
    /// Fetch the current reading for one facility.
    async fn fetch(&self, facility_id: &str) -> Result<OccupancySnapshot, OccupancyError>;

    /// Fetch the id -> name listing of every facility the API knows about.
    async fn fetch_all(&self) -> Result<BTreeMap<String, String>, OccupancyError>;
}
