//! Prompt construction.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::analytics::CategoryKind;

/// Number of categories listed under STATS.
const TOP_CATEGORIES: usize = 5;

/// Which question to ask the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// One actionable piece of advice.
    Advice,
    /// A two-sentence recap.
    Summary,
    /// The single most unusual expense.
    Anomaly,
}

impl PromptKind {
    /// Parses a query value; unknown values mean [`PromptKind::Advice`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "summary" => Self::Summary,
            "anomaly" => Self::Anomaly,
            _ => Self::Advice,
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Advice => "advice",
            Self::Summary => "summary",
            Self::Anomaly => "anomaly",
        }
    }
}

/// Total of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStat {
    /// Category name.
    pub name: String,
    /// Income or expense.
    pub kind: CategoryKind,
    /// Total in base currency.
    pub total: Decimal,
}

/// One large expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDetail {
    /// When it happened.
    pub date: DateTime<Utc>,
    /// Amount in base currency.
    pub amount: Decimal,
    /// What was paid, in `currency`.
    pub original_amount: Option<Decimal>,
    /// Currency of `original_amount`.
    pub currency: String,
    /// Category name.
    pub category: String,
    /// User note.
    pub note: Option<String>,
}

/// Figures for one period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdviceInput {
    /// Total income.
    pub income: Decimal,
    /// Total expense.
    pub expense: Decimal,
    /// Category totals, largest first.
    pub categories: Vec<CategoryStat>,
    /// Largest expenses, largest first.
    pub top_expenses: Vec<ExpenseDetail>,
}

impl AdviceInput {
    /// Aggregates `(category, kind, amount)` rows.
    #[must_use]
    pub fn from_rows(
        rows: &[(String, CategoryKind, Decimal)],
        top_expenses: Vec<ExpenseDetail>,
    ) -> Self {
        let mut sums: HashMap<(&str, CategoryKind), Decimal> = HashMap::new();
        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;

        for (name, kind, amount) in rows {
            *sums.entry((name.as_str(), *kind)).or_default() += *amount;
            match kind {
                CategoryKind::Income => income += *amount,
                CategoryKind::Expense => expense += *amount,
            }
        }

        let mut categories: Vec<CategoryStat> = sums
            .into_iter()
            .map(|((name, kind), total)| CategoryStat {
                name: name.to_string(),
                kind,
                total,
            })
            .collect();
        categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

        Self {
            income,
            expense,
            categories,
            top_expenses,
        }
    }

    /// True when the period has neither income nor expense.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.income.is_zero() && self.expense.is_zero()
    }
}

/// Message returned instead of advice for an empty period.
#[must_use]
pub fn empty_period_message(range_label: &str) -> String {
    format!("No transactions found for this {range_label}. Track some expenses first!")
}

/// Renders the STATS and DETAILS sections.
#[must_use]
pub fn data_block(input: &AdviceInput, currency: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "STATS:");
    let _ = writeln!(out, "- Income: {:.2} {currency}", input.income);
    let _ = writeln!(out, "- Expense: {:.2} {currency}", input.expense);
    let _ = writeln!(out, "- Categories:");
    for stat in input.categories.iter().take(TOP_CATEGORIES) {
        let _ = writeln!(
            out,
            "  * {} ({}): {:.2} {currency}",
            stat.name, stat.kind, stat.total
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "DETAILS (Top Expenses):");
    for tx in &input.top_expenses {
        let amount = match tx.original_amount {
            Some(original) if !tx.currency.eq_ignore_ascii_case(currency) => format!(
                "{original:.2} {} (~{:.2} {currency})",
                tx.currency, tx.amount
            ),
            _ => format!("{:.2} {currency}", tx.amount),
        };
        let note = tx
            .note
            .as_deref()
            .filter(|note| !note.trim().is_empty())
            .map(|note| format!(" - Note: \"{note}\""))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "- {}: {amount} ({}){note}",
            tx.date.format("%d %b"),
            tx.category
        );
    }

    out
}

/// Builds the full prompt for `kind`.
#[must_use]
pub fn build_prompt(kind: PromptKind, input: &AdviceInput, currency: &str) -> String {
    let data = data_block(input, currency);
    match kind {
        PromptKind::Advice => format!(
            "Analyze the user's spending data. \
             DATA: STATS (Total income/expense) and DETAILS (Top expenses).\n\
             {data}\n\
             TASK: Give one short, actionable piece of advice (max 2 sentences). \
             Focus on the largest spending category or a specific concerning transaction note. \
             Use the currency {currency} for all amounts. \
             IMPORTANT: NO greetings, NO filler words. Direct start."
        ),
        PromptKind::Summary => format!(
            "Summarize this period in 2 short sentences.\n\
             {data}\n\
             Mention total income/expense and the top category. Use {currency}. NO greetings."
        ),
        PromptKind::Anomaly => format!(
            "Find the single largest/most unusual expense.\n\
             {data}\n\
             State what it is and why it stands out. Use {currency}. 1 sentence only."
        ),
    }
}
