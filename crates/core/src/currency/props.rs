//! Property-based tests for rate lookup and conversion.
//!
//! - rate(X, X) is exactly one without any cache state
//! - cross rates are exact against the cached quotes
//! - A→B→A round trips to one within decimal precision
//! - empty cache without credential is parity
//! - a failing provider leaves the store untouched

use std::sync::Arc;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::{CurrencyService, PARITY_RATE};
use super::snapshot::RateSnapshot;
use super::store::RateStore;
use super::testing::FailingProvider;

const CODES: [&str; 8] = ["USD", "EUR", "TRY", "KZT", "GBP", "JPY", "RUB", "UZS"];

/// Strategy to generate a currency code from the pool.
fn currency_code() -> impl Strategy<Value = &'static str> {
    prop::sample::select(CODES.to_vec())
}

/// Strategy to generate any three-letter code, known or not.
fn any_code() -> impl Strategy<Value = String> {
    "[A-Za-z]{3}"
}

/// Strategy to generate positive quotes (0.0001 to 100000.0000).
fn positive_quote() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate a populated service with quotes for every code.
fn populated_service() -> impl Strategy<Value = CurrencyService> {
    prop::collection::vec(positive_quote(), CODES.len()).prop_map(|quotes| {
        let store = RateStore::new();
        store.replace(RateSnapshot::new(
            "USD",
            CODES.iter().copied().zip(quotes),
            Utc::now(),
        ));
        CurrencyService::new(
            store,
            Some(Arc::new(FailingProvider)),
            "USD",
            Duration::hours(1),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Same-currency rate is exactly one, even with no cache and no credential.
    #[test]
    fn prop_same_currency_is_one(code in any_code()) {
        let service = CurrencyService::new(RateStore::new(), None, "USD", Duration::hours(1));
        prop_assert_eq!(service.rate(&code, &code.to_ascii_lowercase()), Decimal::ONE);
    }

    /// Cross rate equals (1 / value(A)) * value(B) exactly.
    #[test]
    fn prop_cross_rate_is_exact(
        service in populated_service(),
        from in currency_code(),
        to in currency_code(),
    ) {
        prop_assume!(from != to);
        let store = service.store();
        let expected = (Decimal::ONE / store.value_of(from)) * store.value_of(to);
        prop_assert_eq!(service.rate(from, to), expected);
    }

    /// rate(A, B) * rate(B, A) is one within decimal precision.
    #[test]
    fn prop_round_trip_is_one(
        service in populated_service(),
        from in currency_code(),
        to in currency_code(),
    ) {
        let product = service.rate(from, to) * service.rate(to, from);
        let tolerance = Decimal::new(1, 12);
        prop_assert!(
            (product - Decimal::ONE).abs() <= tolerance,
            "round trip {} -> {} gave {}", from, to, product
        );
    }

    /// With an empty cache and no credential every pair is parity.
    #[test]
    fn prop_empty_cache_without_credential_is_parity(
        from in any_code(),
        to in any_code(),
    ) {
        let service = CurrencyService::new(RateStore::new(), None, "USD", Duration::hours(1));
        prop_assert_eq!(service.rate(&from, &to), PARITY_RATE);
    }

    /// A failing provider leaves the old snapshot in place and rate() still answers.
    #[test]
    fn prop_failed_refresh_keeps_snapshot(
        service in populated_service(),
        from in currency_code(),
        to in currency_code(),
    ) {
        let before = service.rate(from, to);
        let snapshot_before = service.store().snapshot();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        prop_assert!(runtime.block_on(service.refresh()).is_err());

        let snapshot_after = service.store().snapshot();
        let unchanged = match (&snapshot_before, &snapshot_after) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        prop_assert!(unchanged);
        prop_assert_eq!(service.rate(from, to), before);
    }
}
