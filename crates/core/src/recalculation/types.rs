//! Recalculation types and the storage boundary.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sana_shared::types::{CurrencyCode, UserId};
use serde::Serialize;

/// Number of transactions loaded per page.
pub const DEFAULT_PAGE_SIZE: u64 = 500;

/// Currency assumed for rows written before `currency` was tracked.
pub const LEGACY_CURRENCY: &str = "USD";

/// The money columns of one stored transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAmounts {
    /// Transaction id; pages are ordered by it.
    pub id: i32,
    /// Derived amount in the user's base currency.
    pub amount: Decimal,
    /// What was actually paid, in `currency`. `None` on legacy rows.
    pub original_amount: Option<Decimal>,
    /// Currency of `original_amount`.
    pub currency: String,
}

impl StoredAmounts {
    /// The recorded value and its currency.
    ///
    /// Legacy rows without `original_amount` fall back to `amount`, and a
    /// blank currency falls back to [`LEGACY_CURRENCY`].
    #[must_use]
    pub fn source(&self) -> (Decimal, &str) {
        let value = self.original_amount.unwrap_or(self.amount);
        let currency = match self.currency.trim() {
            "" => LEGACY_CURRENCY,
            code => code,
        };
        (value, currency)
    }
}

/// Storage operations the protocol needs.
///
/// Implementations are expected to run every call against the same unit of
/// work and commit only after [`super::Recalculator::change_base_currency`]
/// returns `Ok`.
#[async_trait]
pub trait RecalculationStore: Send + Sync {
    /// Storage error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Loads the user's base currency, creating the settings row with
    /// `default` if it does not exist.
    async fn load_or_create_base_currency(
        &self,
        user_id: &UserId,
        default: &CurrencyCode,
    ) -> Result<String, Self::Error>;

    /// Stores a new base currency for the user.
    async fn set_base_currency(
        &self,
        user_id: &UserId,
        code: &CurrencyCode,
    ) -> Result<(), Self::Error>;

    /// Up to `limit` of the user's transactions with `id > after`, ordered by id.
    async fn transactions_after(
        &self,
        user_id: &UserId,
        after: Option<i32>,
        limit: u64,
    ) -> Result<Vec<StoredAmounts>, Self::Error>;

    /// Overwrites the derived amount of one transaction.
    async fn write_amount(&self, transaction_id: i32, amount: Decimal) -> Result<(), Self::Error>;
}

/// Whether anything changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecalculationStatus {
    /// The requested currency was already the base currency.
    NoChange,
    /// The base currency changed and amounts were rewritten.
    Updated,
}

/// Result of a base-currency change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecalculationReport {
    /// Outcome.
    pub status: RecalculationStatus,
    /// Number of transactions whose amount was recomputed.
    pub recalculated_transactions: u64,
    /// The base currency after the call.
    pub new_currency: CurrencyCode,
}
