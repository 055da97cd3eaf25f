//! The recalculation protocol.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sana_shared::types::{CurrencyCode, MONEY_SCALE, UserId};
use tracing::{info, warn};

use super::types::{
    DEFAULT_PAGE_SIZE, RecalculationReport, RecalculationStatus, RecalculationStore, StoredAmounts,
};
use crate::currency::{RateLookup, convert_amount};

/// Recomputes `amount` for a stored transaction at `rate`.
///
/// The product is rounded to the money scale. On overflow the source value
/// is kept unconverted.
#[must_use]
pub fn rebased_amount(row: &StoredAmounts, rate: Decimal) -> Decimal {
    let (value, currency) = row.source();
    convert_amount(value, rate, MONEY_SCALE).unwrap_or_else(|| {
        warn!(
            transaction_id = row.id,
            %currency,
            %rate,
            "Recalculation overflow; keeping source value"
        );
        value
    })
}

/// Runs base-currency changes page by page.
#[derive(Debug, Clone)]
pub struct Recalculator {
    page_size: u64,
    default_currency: CurrencyCode,
}

impl Default for Recalculator {
    fn default() -> Self {
        Self::new(CurrencyCode::usd())
    }
}

impl Recalculator {
    /// Creates a recalculator. `default_currency` seeds missing settings rows.
    #[must_use]
    pub const fn new(default_currency: CurrencyCode) -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            default_currency,
        }
    }

    /// Overrides the page size (minimum 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Switches the user's base currency and rewrites every derived amount.
    ///
    /// Rates are resolved once per source currency so a concurrent cache
    /// refresh cannot mix two snapshots within one run. Returns on the first
    /// storage error; the caller must then discard the unit of work.
    pub async fn change_base_currency<S, R>(
        &self,
        store: &S,
        rates: &R,
        user_id: &UserId,
        new_currency: &CurrencyCode,
    ) -> Result<RecalculationReport, S::Error>
    where
        S: RecalculationStore + ?Sized,
        R: RateLookup + ?Sized,
    {
        let current = store
            .load_or_create_base_currency(user_id, &self.default_currency)
            .await?;

        if current.trim().eq_ignore_ascii_case(new_currency.as_str()) {
            return Ok(RecalculationReport {
                status: RecalculationStatus::NoChange,
                recalculated_transactions: 0,
                new_currency: new_currency.clone(),
            });
        }

        store.set_base_currency(user_id, new_currency).await?;

        let mut rate_cache: HashMap<String, Decimal> = HashMap::new();
        let mut after = None;
        let mut count: u64 = 0;

        loop {
            let page = store
                .transactions_after(user_id, after, self.page_size)
                .await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);
            let page_len = page.len();

            for row in &page {
                let (_, source_currency) = row.source();
                let key = source_currency.to_ascii_uppercase();
                let rate = *rate_cache
                    .entry(key)
                    .or_insert_with_key(|code| rates.rate(code, new_currency.as_str()));

                store.write_amount(row.id, rebased_amount(row, rate)).await?;
                count += 1;
            }

            if (page_len as u64) < self.page_size {
                break;
            }
        }

        info!(
            user_id = %user_id,
            from = %current,
            to = %new_currency,
            transactions = count,
            "Base currency changed"
        );

        Ok(RecalculationReport {
            status: RecalculationStatus::Updated,
            recalculated_transactions: count,
            new_currency: new_currency.clone(),
        })
    }
}
