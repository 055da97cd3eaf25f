//! In-memory providers for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::provider::{ProviderError, RateProvider};
use super::snapshot::RateSnapshot;

/// Always answers with the same quotes.
pub struct StaticProvider {
    quotes: Vec<(String, Decimal)>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new<const N: usize>(quotes: [(&str, Decimal); N]) -> Self {
        Self {
            quotes: quotes
                .into_iter()
                .map(|(code, value)| (code.to_string(), value))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for StaticProvider {
    async fn fetch(&self, reference: &str) -> Result<RateSnapshot, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RateSnapshot::new(
            reference,
            self.quotes.iter().map(|(code, value)| (code.as_str(), *value)),
            Utc::now(),
        ))
    }
}

/// Always fails as if the network were down.
pub struct FailingProvider;

#[async_trait]
impl RateProvider for FailingProvider {
    async fn fetch(&self, _reference: &str) -> Result<RateSnapshot, ProviderError> {
        Err(ProviderError::Transport("connection refused".to_string()))
    }
}
