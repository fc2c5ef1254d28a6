use crate::app_config::{AppConfig, Environment};
use crate::geo::Coordinate;
use crate::ConfigError;

const DEFAULT_BASE_URL: &str = "https://api.transport.nsw.gov.au/v1";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f64 = |var: &str| -> Result<Option<f64>, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw
                .parse::<f64>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(None),
        }
    };

    let api_key = require("PARKWATCH_API_KEY")?;
    if api_key.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "PARKWATCH_API_KEY".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let env = parse_environment(&or_default("PARKWATCH_ENV", "development"))?;
    let base_url = or_default("PARKWATCH_BASE_URL", DEFAULT_BASE_URL);
    let log_level = or_default("PARKWATCH_LOG_LEVEL", "info");
    let facilities_path = PathBuf::from(or_default(
        "PARKWATCH_FACILITIES_PATH",
        "./config/facilities.yaml",
    ));
    let store_path = PathBuf::from(or_default("PARKWATCH_STORE_PATH", "./data/facilities.json"));

    let request_timeout_secs = parse_u64("PARKWATCH_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PARKWATCH_USER_AGENT", "parkwatch/0.1 (occupancy-refresh)");
    let min_api_interval_ms = parse_u64("PARKWATCH_MIN_API_INTERVAL_MS", "500")?;
    let remaining_delay_ms = parse_u64("PARKWATCH_REMAINING_DELAY_MS", "1000")?;
    let nearest_count = parse_usize("PARKWATCH_NEAREST_COUNT", "5")?;
    let foreground_tick_secs = parse_u64("PARKWATCH_FOREGROUND_TICK_SECS", "30")?;
    let background_tick_secs = parse_u64("PARKWATCH_BACKGROUND_TICK_SECS", "300")?;

    if foreground_tick_secs == 0 || background_tick_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: if foreground_tick_secs == 0 {
                "PARKWATCH_FOREGROUND_TICK_SECS".to_string()
            } else {
                "PARKWATCH_BACKGROUND_TICK_SECS".to_string()
            },
            reason: "tick interval must be greater than zero".to_string(),
        });
    }

    let location_override = match (
        parse_f64("PARKWATCH_LATITUDE")?,
        parse_f64("PARKWATCH_LONGITUDE")?,
    ) {
        (Some(latitude), Some(longitude)) => {
            let coordinate = Coordinate::new(latitude, longitude);
            if !coordinate.is_valid() {
                return Err(ConfigError::InvalidEnvVar {
                    var: "PARKWATCH_LATITUDE".to_string(),
                    reason: format!("coordinate ({latitude}, {longitude}) is out of range"),
                });
            }
            Some(coordinate)
        }
        (None, None) => None,
        (Some(_), None) => {
            return Err(ConfigError::MissingEnvVar("PARKWATCH_LONGITUDE".to_string()))
        }
        (None, Some(_)) => {
            return Err(ConfigError::MissingEnvVar("PARKWATCH_LATITUDE".to_string()))
        }
    };

    Ok(AppConfig {
        env,
        api_key,
        base_url,
        log_level,
        facilities_path,
        store_path,
        request_timeout_secs,
        user_agent,
        min_api_interval_ms,
        remaining_delay_ms,
        nearest_count,
        foreground_tick_secs,
        background_tick_secs,
        location_override,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PARKWATCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
