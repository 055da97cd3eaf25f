//! Rate provider boundary.
//!
//! A provider performs exactly one network call per [`RateProvider::fetch`].
//! Retry cadence belongs to the caller (see [`super::refresher`]).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use super::snapshot::RateSnapshot;

/// The provider could not produce a snapshot.
///
/// Every variant means "provider unavailable"; callers keep the old snapshot.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network error or timeout.
    #[error("rate provider transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status or an explicit error result.
    #[error("rate provider returned {0}")]
    Status(String),

    /// Response body could not be understood.
    #[error("rate provider response malformed: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Source of rate snapshots.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches quotes for every currency against `reference`.
    async fn fetch(&self, reference: &str) -> Result<RateSnapshot, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    conversion_rates: Option<HashMap<String, Decimal>>,
}

/// ExchangeRate-API v6 client (`GET {base}/{key}/latest/{reference}`).
#[derive(Clone)]
pub struct ExchangeRateApiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for ExchangeRateApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeRateApiProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ExchangeRateApiProvider {
    /// Creates a client with a bounded request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn latest_url(&self, reference: &str) -> String {
        format!("{}/{}/latest/{}", self.base_url, self.api_key, reference)
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    async fn fetch(&self, reference: &str) -> Result<RateSnapshot, ProviderError> {
        let response = self.client.get(self.latest_url(reference)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.to_string()));
        }

        let body: LatestResponse = response.json().await?;
        parse_latest(reference, body)
    }
}

fn parse_latest(reference: &str, body: LatestResponse) -> Result<RateSnapshot, ProviderError> {
    if let Some(result) = body.result.as_deref()
        && result != "success"
    {
        let reason = body.error_type.unwrap_or_else(|| result.to_string());
        return Err(ProviderError::Status(reason));
    }

    let rates = body
        .conversion_rates
        .ok_or_else(|| ProviderError::Malformed("missing conversion_rates".to_string()))?;
    if rates.is_empty() {
        return Err(ProviderError::Malformed("empty conversion_rates".to_string()));
    }

    Ok(RateSnapshot::new(reference, rates, Utc::now()))
}
