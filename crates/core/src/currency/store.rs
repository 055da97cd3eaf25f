//! Process-wide rate cache.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::snapshot::RateSnapshot;

/// Holds the latest [`RateSnapshot`].
///
/// Cloning the store clones the handle, not the cache. Readers take an
/// `Arc` to the current snapshot and never see a partially written one:
/// [`RateStore::replace`] swaps the whole pointer under the write lock.
#[derive(Debug, Clone, Default)]
pub struct RateStore {
    current: Arc<RwLock<Option<Arc<RateSnapshot>>>>,
}

impl RateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<RateSnapshot>> {
        // A poisoned lock still holds a complete snapshot pointer.
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Quote for `code`, or one when the code is unknown or the store is empty.
    #[must_use]
    pub fn value_of(&self, code: &str) -> Decimal {
        self.snapshot()
            .map_or(Decimal::ONE, |snapshot| snapshot.value_of(code))
    }

    /// Atomically replaces the held snapshot.
    pub fn replace(&self, snapshot: RateSnapshot) {
        let snapshot = Arc::new(snapshot);
        match self.current.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }

    /// When the held snapshot was fetched.
    #[must_use]
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.snapshot().map(|snapshot| snapshot.fetched_at())
    }

    /// Returns true when no snapshot has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(eur: Decimal) -> RateSnapshot {
        RateSnapshot::new("USD", [("EUR", eur)], Utc::now())
    }

    #[test]
    fn test_empty_store_is_parity() {
        let store = RateStore::new();
        assert!(store.is_empty());
        assert!(store.last_refreshed().is_none());
        assert_eq!(store.value_of("EUR"), Decimal::ONE);
    }

    #[test]
    fn test_unknown_currency_is_parity() {
        let store = RateStore::new();
        store.replace(snapshot(dec!(0.92)));
        assert_eq!(store.value_of("eur"), dec!(0.92));
        assert_eq!(store.value_of("XYZ"), Decimal::ONE);
    }

    #[test]
    fn test_replace_swaps_whole_snapshot() {
        let store = RateStore::new();
        store.replace(snapshot(dec!(0.92)));
        let before = store.snapshot().unwrap();

        store.replace(RateSnapshot::new("USD", [("GBP", dec!(0.79))], Utc::now()));

        // Readers holding the old snapshot keep a consistent view.
        assert_eq!(before.get("EUR"), Some(dec!(0.92)));
        assert_eq!(store.value_of("EUR"), Decimal::ONE);
        assert_eq!(store.value_of("GBP"), dec!(0.79));
    }

    #[test]
    fn test_clones_share_cache() {
        let store = RateStore::new();
        let handle = store.clone();
        handle.replace(snapshot(dec!(0.9)));
        assert_eq!(store.value_of("EUR"), dec!(0.9));
    }
}
