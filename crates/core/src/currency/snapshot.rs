//! Immutable rate snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// One complete set of quotes against a reference currency.
///
/// Each value answers "how many units of this currency equal one unit of
/// the reference currency". Snapshots are never mutated after construction;
/// the store replaces them wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSnapshot {
    reference: String,
    values: HashMap<String, Decimal>,
    fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    /// Builds a snapshot from raw provider quotes.
    ///
    /// Codes are upper-cased, non-positive quotes are discarded and the
    /// reference currency is pinned to exactly one.
    #[must_use]
    pub fn new<I, K>(reference: &str, quotes: I, fetched_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: AsRef<str>,
    {
        let reference = reference.trim().to_ascii_uppercase();
        let mut values: HashMap<String, Decimal> = quotes
            .into_iter()
            .filter(|(_, value)| value.is_sign_positive() && !value.is_zero())
            .map(|(code, value)| (code.as_ref().trim().to_ascii_uppercase(), value))
            .collect();
        values.insert(reference.clone(), Decimal::ONE);

        Self {
            reference,
            values,
            fetched_at,
        }
    }

    /// Reference currency code.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Quote for `code`, if present. `code` must already be upper-cased.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<Decimal> {
        self.values.get(code).copied()
    }

    /// Quote for `code` in any case, or one when the code is not quoted.
    ///
    /// Unknown codes are treated as parity with the reference currency.
    #[must_use]
    pub fn value_of(&self, code: &str) -> Decimal {
        self.get(&code.trim().to_ascii_uppercase()).unwrap_or(Decimal::ONE)
    }

    /// All quotes keyed by currency code.
    #[must_use]
    pub fn values(&self) -> &HashMap<String, Decimal> {
        &self.values
    }

    /// When the provider produced this snapshot.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Returns true when the snapshot is older than `freshness` at `now`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, freshness: Duration) -> bool {
        now - self.fetched_at > freshness
    }

    /// Number of quoted currencies, reference included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; the reference currency is always quoted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_normalizes_and_filters() {
        let snapshot = RateSnapshot::new(
            "usd",
            [
                ("eur", dec!(0.92)),
                ("TRY", dec!(33.3)),
                ("BAD", dec!(0)),
                ("NEG", dec!(-1.5)),
            ],
            Utc::now(),
        );

        assert_eq!(snapshot.reference(), "USD");
        assert_eq!(snapshot.get("USD"), Some(Decimal::ONE));
        assert_eq!(snapshot.get("EUR"), Some(dec!(0.92)));
        assert_eq!(snapshot.get("TRY"), Some(dec!(33.3)));
        assert_eq!(snapshot.get("BAD"), None);
        assert_eq!(snapshot.get("NEG"), None);
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_reference_is_pinned_to_one() {
        let snapshot = RateSnapshot::new("USD", [("USD", dec!(1.0001))], Utc::now());
        assert_eq!(snapshot.get("USD"), Some(Decimal::ONE));
    }

    #[test]
    fn test_value_of_falls_back_to_parity() {
        let snapshot = RateSnapshot::new("USD", [("TRY", dec!(33.3))], Utc::now());
        assert_eq!(snapshot.value_of(" try "), dec!(33.3));
        assert_eq!(snapshot.value_of("XYZ"), Decimal::ONE);
        assert_eq!(snapshot.value_of("usd"), Decimal::ONE);
    }

    #[test]
    fn test_is_stale() {
        let fetched_at = Utc::now();
        let snapshot = RateSnapshot::new("USD", Vec::<(&str, Decimal)>::new(), fetched_at);
        let hour = Duration::hours(1);

        assert!(!snapshot.is_stale(fetched_at + Duration::minutes(59), hour));
        assert!(snapshot.is_stale(fetched_at + Duration::minutes(61), hour));
    }
}
