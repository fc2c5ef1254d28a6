pub mod app_config;
pub mod config;
pub mod error;
pub mod facilities;
pub mod geo;
pub mod progress;
pub mod record;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use facilities::{load_catalogue, CadenceAllowList, Catalogue, FacilityInfo};
pub use geo::Coordinate;
pub use progress::{FacilityStats, InitialLoadProgress, RefreshStats};
pub use record::{
    failure_backoff, AppState, AvailabilityStatus, CadenceGroup, FacilityRecord,
    OccupancySnapshot, OCCUPANCY_CACHE_VALIDITY,
};
