//! Recalculation protocol tests against an in-memory store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sana_shared::types::{CurrencyCode, UserId};

use super::*;

#[derive(Debug, thiserror::Error)]
#[error("storage failed")]
struct StorageFailed;

#[derive(Default)]
struct MemoryStore {
    settings: Mutex<HashMap<String, String>>,
    rows: Mutex<BTreeMap<i32, StoredAmounts>>,
    pages_read: Mutex<usize>,
    fail_writes_after: Option<usize>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    fn with_rows(rows: Vec<StoredAmounts>) -> Self {
        let store = Self::default();
        {
            let mut map = store.rows.lock().unwrap();
            for row in rows {
                map.insert(row.id, row);
            }
        }
        store
    }

    fn amount(&self, id: i32) -> Decimal {
        self.rows.lock().unwrap()[&id].amount
    }

    fn base(&self, user: &str) -> Option<String> {
        self.settings.lock().unwrap().get(user).cloned()
    }
}

#[async_trait]
impl RecalculationStore for MemoryStore {
    type Error = StorageFailed;

    async fn load_or_create_base_currency(
        &self,
        user_id: &UserId,
        default: &CurrencyCode,
    ) -> Result<String, StorageFailed> {
        let mut settings = self.settings.lock().unwrap();
        Ok(settings
            .entry(user_id.as_str().to_string())
            .or_insert_with(|| default.as_str().to_string())
            .clone())
    }

    async fn set_base_currency(
        &self,
        user_id: &UserId,
        code: &CurrencyCode,
    ) -> Result<(), StorageFailed> {
        self.settings
            .lock()
            .unwrap()
            .insert(user_id.as_str().to_string(), code.as_str().to_string());
        Ok(())
    }

    async fn transactions_after(
        &self,
        _user_id: &UserId,
        after: Option<i32>,
        limit: u64,
    ) -> Result<Vec<StoredAmounts>, StorageFailed> {
        *self.pages_read.lock().unwrap() += 1;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|row| after.is_none_or(|after| row.id > after))
            .take(usize::try_from(limit).unwrap())
            .cloned()
            .collect())
    }

    async fn write_amount(&self, transaction_id: i32, amount: Decimal) -> Result<(), StorageFailed> {
        let mut writes = self.writes.lock().unwrap();
        if self.fail_writes_after.is_some_and(|limit| *writes >= limit) {
            return Err(StorageFailed);
        }
        *writes += 1;
        if let Some(row) = self.rows.lock().unwrap().get_mut(&transaction_id) {
            row.amount = amount;
        }
        Ok(())
    }
}

fn row(id: i32, amount: Decimal, original: Option<Decimal>, currency: &str) -> StoredAmounts {
    StoredAmounts {
        id,
        amount,
        original_amount: original,
        currency: currency.to_string(),
    }
}

fn code(raw: &str) -> CurrencyCode {
    CurrencyCode::parse(raw).unwrap()
}

/// TRY→USD at 0.03, everything else through a small table.
fn fixed_rates(from: &str, to: &str) -> Decimal {
    match (from, to) {
        (a, b) if a == b => Decimal::ONE,
        ("TRY", "USD") => dec!(0.03),
        ("USD", "EUR") => dec!(0.92),
        ("TRY", "EUR") => dec!(0.0276),
        ("KZT", "USD") => dec!(0.002),
        _ => Decimal::ONE,
    }
}

#[tokio::test]
async fn test_try_to_usd_scenario() {
    let store = MemoryStore::with_rows(vec![row(1, dec!(100), Some(dec!(100)), "TRY")]);
    store
        .settings
        .lock()
        .unwrap()
        .insert("42".into(), "TRY".into());

    let report = Recalculator::default()
        .change_base_currency(&store, &fixed_rates, &UserId::new("42"), &code("USD"))
        .await
        .unwrap();

    assert_eq!(report.status, RecalculationStatus::Updated);
    assert_eq!(report.recalculated_transactions, 1);
    assert_eq!(store.amount(1), dec!(3.00));
    assert_eq!(store.base("42").as_deref(), Some("USD"));

    let kept = store.rows.lock().unwrap()[&1].clone();
    assert_eq!(kept.original_amount, Some(dec!(100)));
    assert_eq!(kept.currency, "TRY");
}

#[tokio::test]
async fn test_second_call_is_no_change() {
    let store = MemoryStore::with_rows(vec![
        row(1, dec!(100), Some(dec!(100)), "TRY"),
        row(2, dec!(10), Some(dec!(10)), "USD"),
    ]);
    let user = UserId::new("7");
    let recalculator = Recalculator::default();

    let first = recalculator
        .change_base_currency(&store, &fixed_rates, &user, &code("EUR"))
        .await
        .unwrap();
    assert_eq!(first.status, RecalculationStatus::Updated);
    let after_first = (store.amount(1), store.amount(2));

    let second = recalculator
        .change_base_currency(&store, &fixed_rates, &user, &code("eur"))
        .await
        .unwrap();

    assert_eq!(second.status, RecalculationStatus::NoChange);
    assert_eq!(second.recalculated_transactions, 0);
    assert_eq!((store.amount(1), store.amount(2)), after_first);
}

#[tokio::test]
async fn test_missing_settings_row_is_created_with_default() {
    let store = MemoryStore::default();
    let user = UserId::new("9");

    let report = Recalculator::default()
        .change_base_currency(&store, &fixed_rates, &user, &code("USD"))
        .await
        .unwrap();

    assert_eq!(report.status, RecalculationStatus::NoChange);
    assert_eq!(store.base("9").as_deref(), Some("USD"));
}

#[tokio::test]
async fn test_legacy_row_falls_back_to_amount() {
    let store = MemoryStore::with_rows(vec![row(5, dec!(250), None, "KZT")]);
    let before = store.amount(5);

    Recalculator::new(code("KZT"))
        .change_base_currency(&store, &fixed_rates, &UserId::new("1"), &code("USD"))
        .await
        .unwrap();

    assert_eq!(store.amount(5), before * dec!(0.002));
    assert_eq!(store.amount(5), dec!(0.50));
    assert_eq!(store.rows.lock().unwrap()[&5].original_amount, None);
}

#[tokio::test]
async fn test_blank_currency_uses_legacy_default() {
    let store = MemoryStore::with_rows(vec![row(3, dec!(10), None, "")]);

    Recalculator::default()
        .change_base_currency(&store, &fixed_rates, &UserId::new("1"), &code("EUR"))
        .await
        .unwrap();

    assert_eq!(store.amount(3), dec!(9.20));
}

#[tokio::test]
async fn test_recalculation_walks_every_page() {
    let rows = (1..=7)
        .map(|id| row(id, dec!(1), Some(dec!(100)), "TRY"))
        .collect();
    let store = MemoryStore::with_rows(rows);

    let report = Recalculator::default()
        .with_page_size(3)
        .change_base_currency(&store, &fixed_rates, &UserId::new("1"), &code("EUR"))
        .await
        .unwrap();

    assert_eq!(report.recalculated_transactions, 7);
    assert_eq!(*store.pages_read.lock().unwrap(), 3);
    for id in 1..=7 {
        assert_eq!(store.amount(id), dec!(2.76));
    }
}

#[tokio::test]
async fn test_storage_error_is_returned() {
    let mut store = MemoryStore::with_rows(vec![
        row(1, dec!(1), Some(dec!(100)), "TRY"),
        row(2, dec!(1), Some(dec!(100)), "TRY"),
    ]);
    store.fail_writes_after = Some(1);

    let result = Recalculator::default()
        .change_base_currency(&store, &fixed_rates, &UserId::new("1"), &code("EUR"))
        .await;

    assert!(result.is_err());
}

#[test]
fn test_rebased_amount_rounds() {
    let stored = row(1, dec!(0), Some(dec!(33.33)), "EUR");
    assert_eq!(rebased_amount(&stored, dec!(1.0867)), dec!(36.22));
}

#[test]
fn test_report_serialization() {
    let report = RecalculationReport {
        status: RecalculationStatus::NoChange,
        recalculated_transactions: 0,
        new_currency: code("usd"),
    };
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        serde_json::json!({
            "status": "no_change",
            "recalculated_transactions": 0,
            "new_currency": "USD"
        })
    );
}

#[test]
fn test_source_of_legacy_row() {
    assert_eq!(
        row(1, dec!(250), None, "KZT").source(),
        (dec!(250), "KZT")
    );
    assert_eq!(row(2, dec!(10), None, " ").source(), (dec!(10), LEGACY_CURRENCY));
    assert_eq!(
        row(3, dec!(3.00), Some(dec!(100)), "TRY").source(),
        (dec!(100), "TRY")
    );
}
