//! Soft recalculation of base-currency amounts.
//!
//! When a user switches base currency, every stored transaction keeps its
//! `original_amount` and `currency` and only the derived `amount` is
//! re-expressed in the new base. Storage is abstracted behind
//! [`RecalculationStore`] so the protocol runs unchanged against the
//! database (inside one transaction) or an in-memory fake.

mod engine;
mod types;

pub use engine::{Recalculator, rebased_amount};
pub use types::{
    DEFAULT_PAGE_SIZE, LEGACY_CURRENCY, RecalculationReport, RecalculationStatus,
    RecalculationStore, StoredAmounts,
};

#[cfg(test)]
mod tests;
