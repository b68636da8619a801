//! Fee oracle client (mempool.space compatible).
//!
//! A single outbound read per call. The underlying client carries a hard
//! timeout so a slow or unreachable oracle surfaces as an error the
//! caller can degrade on, instead of stalling transaction creation.

use crate::types::RecommendedFees;
use paygate_types::FeeOracleConfig;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when querying the fee oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("API request failed: {0}")]
    ApiRequest(String),

    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    ParseResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Async client for the recommended-fees endpoint.
pub struct FeeOracle {
    base_url: String,
    client: reqwest::Client,
}

impl FeeOracle {
    /// Create a new oracle client with the configured base URL and
    /// request timeout.
    pub fn new(config: &FeeOracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Configuration(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get current recommended fee rates (sat/vB).
    pub async fn recommended_fees(&self) -> Result<RecommendedFees, OracleError> {
        let url = format!("{}/v1/fees/recommended", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::ApiRequest(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::ApiError { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::ParseResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_endpoint() {
        let oracle = FeeOracle::new(&FeeOracleConfig::default()).unwrap();
        assert_eq!(oracle.base_url, "https://mempool.space/api");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = FeeOracleConfig {
            base_url: "http://localhost:3000/api/".to_string(),
            timeout_secs: 5,
        };
        let oracle = FeeOracle::new(&config).unwrap();
        assert_eq!(oracle.base_url, "http://localhost:3000/api");
    }
}
