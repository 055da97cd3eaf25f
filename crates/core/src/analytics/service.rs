//! Analytics computations over rows already loaded from storage.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;

use super::period::TimezoneOffset;
use super::types::{CalendarReport, CategoryKind, CategoryTotal, KindTotals};

/// Service for balance and rollup calculations.
pub struct AnalyticsService;

impl AnalyticsService {
    /// Net balance: income minus expense.
    #[must_use]
    pub fn net_balance(rows: &[(CategoryKind, Decimal)]) -> Decimal {
        rows.iter().map(|(kind, amount)| kind.signed(*amount)).sum()
    }

    /// Income, expense and net over `rows`.
    #[must_use]
    pub fn kind_totals(rows: &[(CategoryKind, Decimal)]) -> KindTotals {
        let mut totals = KindTotals::default();
        for (kind, amount) in rows {
            match kind {
                CategoryKind::Income => totals.income += *amount,
                CategoryKind::Expense => totals.expense += *amount,
            }
        }
        totals.net = totals.income - totals.expense;
        totals
    }

    /// Totals per category name, positive totals only, largest first.
    ///
    /// Ties are ordered by name.
    #[must_use]
    pub fn category_totals(rows: &[(String, Decimal)]) -> Vec<CategoryTotal> {
        let mut sums: HashMap<&str, Decimal> = HashMap::new();
        for (name, amount) in rows {
            *sums.entry(name.as_str()).or_default() += *amount;
        }

        let mut totals: Vec<CategoryTotal> = sums
            .into_iter()
            .filter(|(_, total)| *total > Decimal::ZERO)
            .map(|(category, total)| CategoryTotal {
                category: category.to_string(),
                total,
            })
            .collect();
        totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
        totals
    }

    /// Buckets rows into local days of the given local month.
    ///
    /// Rows falling outside the month in local time are ignored.
    #[must_use]
    pub fn calendar(
        rows: &[(DateTime<Utc>, CategoryKind, Decimal)],
        year: i32,
        month: u32,
        offset: TimezoneOffset,
    ) -> CalendarReport {
        let mut report = CalendarReport::default();
        let mut month_rows = Vec::with_capacity(rows.len());

        for (instant, kind, amount) in rows {
            let local = offset.to_local(*instant).date();
            if local.year() != year || local.month() != month {
                continue;
            }
            report
                .days
                .entry(local.format("%Y-%m-%d").to_string())
                .or_default()
                .add(*kind, *amount);
            month_rows.push((*kind, *amount));
        }

        report.month_summary = Self::kind_totals(&month_rows);
        report
    }
}
