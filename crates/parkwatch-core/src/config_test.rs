use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("PARKWATCH_API_KEY", "test-key");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "PARKWATCH_ENV"));
}

#[test]
fn build_app_config_fails_without_api_key() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PARKWATCH_API_KEY"),
        "expected MissingEnvVar(PARKWATCH_API_KEY), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_blank_api_key() {
    let mut map = HashMap::new();
    map.insert("PARKWATCH_API_KEY", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARKWATCH_API_KEY"),
        "expected InvalidEnvVar(PARKWATCH_API_KEY), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("config should build");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.api_key, "test-key");
    assert_eq!(cfg.base_url, "https://api.transport.nsw.gov.au/v1");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(
        cfg.facilities_path.to_str(),
        Some("./config/facilities.yaml")
    );
    assert_eq!(cfg.store_path.to_str(), Some("./data/facilities.json"));
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "parkwatch/0.1 (occupancy-refresh)");
    assert_eq!(cfg.min_api_interval_ms, 500);
    assert_eq!(cfg.remaining_delay_ms, 1000);
    assert_eq!(cfg.nearest_count, 5);
    assert_eq!(cfg.foreground_tick_secs, 30);
    assert_eq!(cfg.background_tick_secs, 300);
    assert!(cfg.location_override.is_none());
}

#[test]
fn debug_output_redacts_api_key() {
    let mut map = full_env();
    map.insert("PARKWATCH_API_KEY", "super-secret-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret-key"), "{rendered}");
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn min_api_interval_override() {
    let mut map = full_env();
    map.insert("PARKWATCH_MIN_API_INTERVAL_MS", "750");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.min_api_interval_ms, 750);
}

#[test]
fn min_api_interval_invalid() {
    let mut map = full_env();
    map.insert("PARKWATCH_MIN_API_INTERVAL_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARKWATCH_MIN_API_INTERVAL_MS"),
        "expected InvalidEnvVar(PARKWATCH_MIN_API_INTERVAL_MS), got: {result:?}"
    );
}

#[test]
fn nearest_count_override() {
    let mut map = full_env();
    map.insert("PARKWATCH_NEAREST_COUNT", "8");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.nearest_count, 8);
}

#[test]
fn nearest_count_invalid() {
    let mut map = full_env();
    map.insert("PARKWATCH_NEAREST_COUNT", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARKWATCH_NEAREST_COUNT"),
        "expected InvalidEnvVar(PARKWATCH_NEAREST_COUNT), got: {result:?}"
    );
}

#[test]
fn zero_foreground_tick_is_rejected() {
    let mut map = full_env();
    map.insert("PARKWATCH_FOREGROUND_TICK_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARKWATCH_FOREGROUND_TICK_SECS"),
        "expected InvalidEnvVar(PARKWATCH_FOREGROUND_TICK_SECS), got: {result:?}"
    );
}

#[test]
fn background_tick_override() {
    let mut map = full_env();
    map.insert("PARKWATCH_BACKGROUND_TICK_SECS", "600");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.background_tick_secs, 600);
}

#[test]
fn location_override_parses_both_coordinates() {
    let mut map = full_env();
    map.insert("PARKWATCH_LATITUDE", "-33.8688");
    map.insert("PARKWATCH_LONGITUDE", "151.2093");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let loc = cfg.location_override.expect("override should be set");
    assert!((loc.latitude - -33.8688).abs() < f64::EPSILON);
    assert!((loc.longitude - 151.2093).abs() < f64::EPSILON);
}

#[test]
fn location_override_requires_both_halves() {
    let mut map = full_env();
    map.insert("PARKWATCH_LATITUDE", "-33.8688");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PARKWATCH_LONGITUDE"),
        "expected MissingEnvVar(PARKWATCH_LONGITUDE), got: {result:?}"
    );
}

#[test]
fn location_override_out_of_range() {
    let mut map = full_env();
    map.insert("PARKWATCH_LATITUDE", "-120.0");
    map.insert("PARKWATCH_LONGITUDE", "151.2093");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARKWATCH_LATITUDE"),
        "expected InvalidEnvVar(PARKWATCH_LATITUDE), got: {result:?}"
    );
}
