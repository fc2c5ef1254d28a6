use std::path::PathBuf;

use crate::geo::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub api_key: String,
    pub base_url: String,
    pub log_level: String,
    pub facilities_path: PathBuf,
    pub store_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub min_api_interval_ms: u64,
    pub remaining_delay_ms: u64,
    pub nearest_count: usize,
    pub foreground_tick_secs: u64,
    pub background_tick_secs: u64,
    /// Fixed device position; `None` falls back to the catalogue centroid.
    pub location_override: Option<Coordinate>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("log_level", &self.log_level)
            .field("facilities_path", &self.facilities_path)
            .field("store_path", &self.store_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("min_api_interval_ms", &self.min_api_interval_ms)
            .field("remaining_delay_ms", &self.remaining_delay_ms)
            .field("nearest_count", &self.nearest_count)
            .field("foreground_tick_secs", &self.foreground_tick_secs)
            .field("background_tick_secs", &self.background_tick_secs)
            .field("location_override", &self.location_override)
            .finish()
    }
}
