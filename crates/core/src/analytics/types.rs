//! Analytics data types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether a category books money in or out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl CategoryKind {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Sign applied to amounts of this kind when computing a balance.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown category kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid category type: '{0}' (expected 'income' or 'expense')")]
pub struct InvalidCategoryKind(pub String);

impl FromStr for CategoryKind {
    type Err = InvalidCategoryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(InvalidCategoryKind(s.to_string())),
        }
    }
}

/// Sum of one category over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Category name.
    pub category: String,
    /// Total amount in base currency.
    pub total: Decimal,
}

/// Income and expense of one local day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTotals {
    /// Income.
    pub income: Decimal,
    /// Expense.
    pub expense: Decimal,
}

impl DayTotals {
    pub(crate) fn add(&mut self, kind: CategoryKind, amount: Decimal) {
        match kind {
            CategoryKind::Income => self.income += amount,
            CategoryKind::Expense => self.expense += amount,
        }
    }
}

/// Income, expense and net of a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTotals {
    /// Income.
    pub income: Decimal,
    /// Expense.
    pub expense: Decimal,
    /// Income minus expense.
    pub net: Decimal,
}

/// Calendar view of one local month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarReport {
    /// Month totals.
    pub month_summary: KindTotals,
    /// Per-day totals keyed by local `YYYY-MM-DD`.
    pub days: BTreeMap<String, DayTotals>,
}
