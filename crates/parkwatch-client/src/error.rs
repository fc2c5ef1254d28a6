use thiserror::Error;

/// Errors returned by the car park occupancy API client.
#[derive(Debug, Error)]
pub enum OccupancyError {
    /// The request could not be built (blank facility id, bad base URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The API answered with an empty result.
    #[error("no data received")]
    NoData,

    /// Network or TLS failure, timeout, or non-2xx status.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("decoding error for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl OccupancyError {
    /// Short label used as the `kind` field in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            OccupancyError::InvalidRequest(_) => "invalid_request",
            OccupancyError::NoData => "no_data",
            OccupancyError::Network(_) => "network",
            OccupancyError::Decode { .. } => "decode",
        }
    }
}
