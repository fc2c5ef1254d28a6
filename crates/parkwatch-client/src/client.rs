//! HTTP client for the car park occupancy REST API.
//!
//! Wraps `reqwest` with API key management and typed response
//! deserialization. The single-facility endpoint answers with either one
//! facility object or an array of them; both shapes are accepted.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parkwatch_core::{AppConfig, OccupancySnapshot};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Url};

use crate::error::OccupancyError;
use crate::types::ApiFacility;
use crate::OccupancyClient;

const DEFAULT_BASE_URL: &str = "https://api.transport.nsw.gov.au/v1";
const DEFAULT_USER_AGENT: &str = "parkwatch/0.1 (occupancy-refresh)";

/// Client for the car park occupancy API.
///
/// Use [`CarParkClient::new`] for production, [`CarParkClient::from_config`]
/// to honour every configured setting, or [`CarParkClient::with_base_url`]
/// to point at a mock server in tests.
pub struct CarParkClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl CarParkClient {
    /// Creates a new client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::Network`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, OccupancyError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::Network`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`OccupancyError::InvalidRequest`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, OccupancyError> {
        Self::build(api_key, timeout_secs, base_url, DEFAULT_USER_AGENT)
    }

    /// Creates a client from the loaded application configuration.
    ///
    /// # Errors
    ///
    /// Same as [`CarParkClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, OccupancyError> {
        Self::build(
            &config.api_key,
            config.request_timeout_secs,
            &config.base_url,
            &config.user_agent,
        )
    }

    fn build(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
        user_agent: &str,
    ) -> Result<Self, OccupancyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so `join("carpark")` appends a segment
        // instead of replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            OccupancyError::InvalidRequest(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Fetches the live reading for one facility.
    ///
    /// # Errors
    ///
    /// - [`OccupancyError::InvalidRequest`] if `facility_id` is blank.
    /// - [`OccupancyError::NoData`] if the API returns an empty array.
    /// - [`OccupancyError::Network`] on network failure or non-2xx HTTP status.
    /// - [`OccupancyError::Decode`] if the response does not match the
    ///   expected shape.
    pub async fn get_facility(&self, facility_id: &str) -> Result<ApiFacility, OccupancyError> {
        let facility_id = facility_id.trim();
        if facility_id.is_empty() {
            return Err(OccupancyError::InvalidRequest(
                "facility id must not be empty".to_string(),
            ));
        }

        let url = self.build_url(&[("facility", facility_id)])?;
        let body = self.request_json(&url).await?;
        let context = format!("carpark(facility={facility_id})");

        let value = match body {
            serde_json::Value::Array(items) => {
                items.into_iter().next().ok_or(OccupancyError::NoData)?
            }
            other => other,
        };

        serde_json::from_value(value).map_err(|e| OccupancyError::Decode { context, source: e })
    }

    /// Fetches the id -> name listing of every facility.
    ///
    /// Historical-only entries are returned as delivered; see
    /// [`exclude_historical`].
    ///
    /// # Errors
    ///
    /// - [`OccupancyError::Network`] on network failure or non-2xx HTTP status.
    /// - [`OccupancyError::Decode`] if the response is not a string map.
    pub async fn list_facilities(&self) -> Result<BTreeMap<String, String>, OccupancyError> {
        let url = self.build_url(&[])?;
        let body = self.request_json(&url).await?;
        serde_json::from_value(body).map_err(|e| OccupancyError::Decode {
            context: "carpark".to_string(),
            source: e,
        })
    }

    /// Builds `{base}/carpark` with the given query parameters.
    fn build_url(&self, params: &[(&str, &str)]) -> Result<Url, OccupancyError> {
        let mut url = self
            .base_url
            .join("carpark")
            .map_err(|e| OccupancyError::InvalidRequest(format!("invalid endpoint: {e}")))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends an authenticated GET, asserts a 2xx status, and parses the body
    /// as JSON.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, OccupancyError> {
        tracing::debug!(url = %url, "client: GET");
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("apikey {}", self.api_key))
            .send()
            .await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| OccupancyError::Decode {
            context: url.path().to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl OccupancyClient for CarParkClient {
    async fn fetch(&self, facility_id: &str) -> Result<OccupancySnapshot, OccupancyError> {
        let facility = self.get_facility(facility_id).await?;
        Ok(facility.into_snapshot(Utc::now()))
    }

    async fn fetch_all(&self) -> Result<BTreeMap<String, String>, OccupancyError> {
        self.list_facilities().await
    }
}

/// Drops entries the operator marks as "historical only".
#[must_use]
pub fn exclude_historical(facilities: BTreeMap<String, String>) -> BTreeMap<String, String> {
    facilities
        .into_iter()
        .filter(|(_, name)| !name.to_lowercase().contains("historical only"))
        .collect()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
