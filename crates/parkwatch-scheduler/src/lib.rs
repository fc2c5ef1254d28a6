//! Occupancy refresh scheduling.
//!
//! [`RefreshScheduler`] owns the refresh policy: a one-time priority-ordered
//! initial load, a perpetual cycle whose spacing follows the [`Lifecycle`]
//! state, and on-demand single-facility refreshes. Every outbound request
//! passes through one shared [`RateLimiter`].

pub mod clock;
pub mod config;
pub mod lifecycle;
pub mod location;
pub mod rate_limit;
pub mod scheduler;
pub mod seed;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulerConfig;
pub use lifecycle::Lifecycle;
pub use location::{nearest, sort_by_distance, DeviceLocation, FixedLocation, LocationProvider};
pub use rate_limit::RateLimiter;
pub use scheduler::{RefreshOutcome, RefreshScheduler, SchedulerState};
pub use seed::{load_static_facilities_if_needed, reload_static_facilities, SeedOutcome};
