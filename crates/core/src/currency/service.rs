//! Currency conversion service.
//!
//! Refresh policy: background-only. [`CurrencyService::rate`] never performs
//! I/O. It answers from whatever snapshot is cached, stale or not, and falls
//! back to [`PARITY_RATE`] when it cannot do better. Keeping the cache warm is
//! the job of [`super::refresher::RateRefresher`] and the startup
//! [`CurrencyService::warm_up`] call.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sana_shared::config::RatesConfig;
use sana_shared::types::MONEY_SCALE;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::conversion::convert_amount;
use super::provider::{ExchangeRateApiProvider, ProviderError, RateProvider};
use super::snapshot::RateSnapshot;
use super::store::RateStore;

/// Multiplier used whenever a real rate cannot be produced.
pub const PARITY_RATE: Decimal = Decimal::from_parts(100, 0, 0, false, 2);

/// Anything that can answer "multiply by what to go from `from` to `to`".
pub trait RateLookup: Send + Sync {
    /// Conversion multiplier from `from` to `to`. Never fails.
    fn rate(&self, from: &str, to: &str) -> Decimal;

    /// Converts `amount` and rounds it to the money scale.
    ///
    /// Falls back to the unconverted amount if the product overflows.
    fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        let rate = self.rate(from, to);
        convert_amount(amount, rate, MONEY_SCALE).unwrap_or_else(|| {
            warn!(%amount, %rate, reason = "arithmetic_failure", "Conversion overflow; using parity");
            convert_amount(amount, PARITY_RATE, MONEY_SCALE).unwrap_or(amount)
        })
    }
}

impl<F> RateLookup for F
where
    F: Fn(&str, &str) -> Decimal + Send + Sync,
{
    fn rate(&self, from: &str, to: &str) -> Decimal {
        self(from, to)
    }
}

/// A refresh attempt did not update the store.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// No provider credential is configured.
    #[error("no rate provider credential configured")]
    MissingCredential,

    /// The provider failed; the previous snapshot was kept.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Converts between currencies using the shared [`RateStore`].
#[derive(Clone)]
pub struct CurrencyService {
    store: RateStore,
    provider: Option<Arc<dyn RateProvider>>,
    reference: String,
    freshness: Duration,
}

impl std::fmt::Debug for CurrencyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyService")
            .field("reference", &self.reference)
            .field("has_provider", &self.provider.is_some())
            .field("freshness", &self.freshness)
            .finish_non_exhaustive()
    }
}

impl CurrencyService {
    /// Creates a service over `store`.
    ///
    /// `provider == None` is the supported degraded mode: every cross-currency
    /// rate is [`PARITY_RATE`].
    #[must_use]
    pub fn new(
        store: RateStore,
        provider: Option<Arc<dyn RateProvider>>,
        reference: &str,
        freshness: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            reference: reference.trim().to_ascii_uppercase(),
            freshness,
        }
    }

    /// Builds the service from configuration, wiring the ExchangeRate-API
    /// provider only when an API key is set.
    pub fn from_config(config: &RatesConfig) -> Result<Self, ProviderError> {
        let provider: Option<Arc<dyn RateProvider>> = match config.api_key() {
            Some(key) => Some(Arc::new(ExchangeRateApiProvider::new(
                config.base_url.clone(),
                key,
                StdDuration::from_secs(config.request_timeout_secs),
            )?)),
            None => {
                warn!("No exchange-rate API key configured; all conversions use parity");
                None
            }
        };

        let freshness = i64::try_from(config.freshness_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);

        Ok(Self::new(
            RateStore::new(),
            provider,
            &config.reference_currency,
            freshness,
        ))
    }

    /// Reference currency every cached quote is expressed against.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &RateStore {
        &self.store
    }

    /// Returns true when a provider credential is configured.
    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Returns true when the cache is empty or older than the freshness window.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.store
            .snapshot()
            .is_none_or(|snapshot| snapshot.is_stale(now, self.freshness))
    }

    /// Conversion multiplier from `from` to `to`.
    ///
    /// `rate = (1 / value(from)) * value(to)` against the cached snapshot.
    /// Same-currency pairs are exactly one. Missing credential, empty cache
    /// and arithmetic failure all yield [`PARITY_RATE`] and are logged.
    #[must_use]
    pub fn rate(&self, from: &str, to: &str) -> Decimal {
        let from = from.trim().to_ascii_uppercase();
        let to = to.trim().to_ascii_uppercase();

        if from == to {
            return Decimal::ONE;
        }

        if self.provider.is_none() {
            debug!(%from, %to, reason = "missing_credential", "Using parity rate");
            return PARITY_RATE;
        }

        let Some(snapshot) = self.store.snapshot() else {
            warn!(%from, %to, reason = "empty_cache", "Using parity rate");
            return PARITY_RATE;
        };

        if snapshot.is_stale(Utc::now(), self.freshness) {
            debug!(
                fetched_at = %snapshot.fetched_at(),
                "Converting with stale snapshot"
            );
        }

        for code in [&from, &to] {
            if snapshot.get(code).is_none() {
                debug!(currency = %code, "Unknown currency treated as parity with reference");
            }
        }
        let from_value = snapshot.value_of(&from);
        let to_value = snapshot.value_of(&to);

        match Decimal::ONE
            .checked_div(from_value)
            .and_then(|inverse| inverse.checked_mul(to_value))
        {
            Some(rate) => rate,
            None => {
                warn!(
                    %from,
                    %to,
                    from_value = %from_value,
                    to_value = %to_value,
                    reason = "arithmetic_failure",
                    "Using parity rate"
                );
                PARITY_RATE
            }
        }
    }

    /// Fetches a fresh snapshot and swaps it in.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let provider = self.provider.as_ref().ok_or(RefreshError::MissingCredential)?;

        match provider.fetch(&self.reference).await {
            Ok(snapshot) => {
                info!(
                    reference = %self.reference,
                    currencies = snapshot.len(),
                    "Exchange rates refreshed"
                );
                self.store.replace(snapshot);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, reference = %self.reference, "Exchange rate refresh failed; keeping previous snapshot");
                Err(e.into())
            }
        }
    }

    /// Makes one fetch attempt at startup. Returns true if the cache is warm.
    pub async fn warm_up(&self) -> bool {
        match self.refresh().await {
            Ok(()) => true,
            Err(RefreshError::MissingCredential) => {
                info!("Skipping rate warm-up: no provider credential");
                false
            }
            Err(RefreshError::Provider(_)) => {
                warn!("Rate warm-up failed; conversions use parity until the next refresh");
                false
            }
        }
    }

    /// Returns the full cached snapshot, fetching first if the cache is empty.
    pub async fn all_rates(&self) -> Option<Arc<RateSnapshot>> {
        if self.store.is_empty() && self.provider.is_some() {
            // Failure is already logged by refresh().
            let _ = self.refresh().await;
        }
        self.store.snapshot()
    }
}

impl RateLookup for CurrencyService {
    fn rate(&self, from: &str, to: &str) -> Decimal {
        Self::rate(self, from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::testing::{FailingProvider, StaticProvider};
    use rust_decimal_macros::dec;

    fn populated() -> CurrencyService {
        let store = RateStore::new();
        store.replace(RateSnapshot::new(
            "USD",
            [("EUR", dec!(0.92)), ("TRY", dec!(33.25)), ("KZT", dec!(470))],
            Utc::now(),
        ));
        CurrencyService::new(
            store,
            Some(Arc::new(FailingProvider)),
            "USD",
            Duration::hours(1),
        )
    }

    #[test]
    fn test_parity_rate_constant() {
        assert_eq!(PARITY_RATE, dec!(1.00));
        assert_eq!(PARITY_RATE.scale(), 2);
    }

    #[test]
    fn test_same_currency_is_one() {
        let service = CurrencyService::new(RateStore::new(), None, "USD", Duration::hours(1));
        assert_eq!(service.rate("try", "TRY"), Decimal::ONE);
    }

    #[test]
    fn test_cross_rate_via_reference() {
        let service = populated();
        assert_eq!(service.rate("USD", "EUR"), dec!(0.92));
        assert_eq!(
            service.rate("TRY", "EUR"),
            (Decimal::ONE / dec!(33.25)) * dec!(0.92)
        );
    }

    #[test]
    fn test_unknown_currency_is_parity_with_reference() {
        let service = populated();
        assert_eq!(service.rate("XYZ", "EUR"), dec!(0.92));
    }

    #[test]
    fn test_no_credential_is_parity_even_with_cache() {
        let store = RateStore::new();
        store.replace(RateSnapshot::new("USD", [("EUR", dec!(0.92))], Utc::now()));
        let service = CurrencyService::new(store, None, "USD", Duration::hours(1));
        assert_eq!(service.rate("USD", "EUR"), PARITY_RATE);
    }

    #[test]
    fn test_empty_cache_is_parity_without_fetch() {
        let service = CurrencyService::new(
            RateStore::new(),
            Some(Arc::new(StaticProvider::new([("EUR", dec!(0.92))]))),
            "USD",
            Duration::hours(1),
        );
        // Background-only policy: rate() does not populate the cache.
        assert_eq!(service.rate("USD", "EUR"), PARITY_RATE);
        assert!(service.store().is_empty());
    }

    #[test]
    fn test_stale_snapshot_is_still_used() {
        let store = RateStore::new();
        store.replace(RateSnapshot::new(
            "USD",
            [("EUR", dec!(0.92))],
            Utc::now() - Duration::hours(5),
        ));
        let service = CurrencyService::new(
            store,
            Some(Arc::new(FailingProvider)),
            "USD",
            Duration::hours(1),
        );
        assert!(service.is_stale(Utc::now()));
        assert_eq!(service.rate("USD", "EUR"), dec!(0.92));
    }

    #[test]
    fn test_convert_rounds_to_money_scale() {
        let service = populated();
        assert_eq!(service.convert(dec!(100), "USD", "EUR"), dec!(92.00));
        assert_eq!(service.convert(dec!(10), "TRY", "USD"), dec!(0.30));
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let service = CurrencyService::new(
            RateStore::new(),
            Some(Arc::new(StaticProvider::new([("EUR", dec!(0.9))]))),
            "USD",
            Duration::hours(1),
        );
        service.refresh().await.unwrap();
        assert_eq!(service.rate("USD", "EUR"), dec!(0.9));
        assert!(!service.is_stale(Utc::now()));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let service = populated();
        let before = service.store().snapshot().unwrap();

        let err = service.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::Provider(_)));

        let after = service.store().snapshot().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(service.rate("USD", "EUR"), dec!(0.92));
    }

    #[tokio::test]
    async fn test_refresh_without_credential() {
        let service = CurrencyService::new(RateStore::new(), None, "USD", Duration::hours(1));
        assert!(matches!(
            service.refresh().await,
            Err(RefreshError::MissingCredential)
        ));
        assert!(!service.warm_up().await);
    }

    #[tokio::test]
    async fn test_all_rates_populates_empty_cache() {
        let service = CurrencyService::new(
            RateStore::new(),
            Some(Arc::new(StaticProvider::new([("EUR", dec!(0.9))]))),
            "USD",
            Duration::hours(1),
        );
        let snapshot = service.all_rates().await.unwrap();
        assert_eq!(snapshot.get("EUR"), Some(dec!(0.9)));
    }

    #[test]
    fn test_from_config_without_key() {
        let service = CurrencyService::from_config(&RatesConfig::default()).unwrap();
        assert!(!service.has_provider());
        assert_eq!(service.reference(), "USD");
    }

    #[test]
    fn test_closures_are_rate_lookups() {
        let fixed = |_: &str, _: &str| dec!(0.03);
        assert_eq!(RateLookup::rate(&fixed, "TRY", "USD"), dec!(0.03));
    }
}
