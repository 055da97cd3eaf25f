//! Transaction repository.
//!
//! Every write converts the recorded `(original_amount, currency)` pair into
//! the owner's base currency once and stores the result in `amount`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sana_core::analytics::CategoryKind;
use sana_core::currency::RateLookup;
use sana_core::recalculation::StoredAmounts;
use sana_shared::types::{CurrencyCode, PageRequest, UserId, round_money};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::Serialize;
use tracing::debug;

use super::category::find_usable_category;
use super::user::insert_user_if_missing;
use crate::entities::{categories, sea_orm_active_enums::CategoryType, transactions, users};

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(i32),

    /// Category not found or not usable by the user.
    #[error("Category not found: {0}")]
    CategoryNotFound(i32),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A transaction joined with its category, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionView {
    /// Transaction ID.
    pub id: i32,
    /// Amount in the owner's base currency.
    pub amount: Decimal,
    /// What was paid, in `currency`.
    pub original_amount: Decimal,
    /// Currency of `original_amount`.
    pub currency: String,
    /// When it happened.
    pub date: DateTime<Utc>,
    /// Category ID.
    pub category_id: i32,
    /// Category name.
    pub category: String,
    /// Category type.
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// User note.
    pub note: Option<String>,
}

impl TransactionView {
    /// Legacy rows are shown with the same recorded value and currency the
    /// recalculation protocol converts from.
    fn from_models(tx: transactions::Model, category: &categories::Model) -> Self {
        let stored = stored_amounts(&tx);
        let (original_amount, currency) = stored.source();

        Self {
            id: tx.id,
            amount: tx.amount,
            original_amount,
            currency: currency.to_string(),
            date: tx.date.with_timezone(&Utc),
            category_id: tx.category_id,
            category: category.name.clone(),
            kind: category.kind.into(),
            note: tx.note,
        }
    }
}

fn stored_amounts(tx: &transactions::Model) -> StoredAmounts {
    StoredAmounts {
        id: tx.id,
        amount: tx.amount,
        original_amount: tx.original_amount,
        currency: tx.currency.clone(),
    }
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Amount paid, in `currency`.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency: CurrencyCode,
    /// Category ID.
    pub category_id: i32,
    /// Resolved transaction instant.
    pub date: DateTime<Utc>,
    /// Optional note.
    pub note: Option<String>,
}

/// Partial update of a transaction. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    /// New amount paid, in the (possibly new) currency.
    pub amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<CurrencyCode>,
    /// New category ID.
    pub category_id: Option<i32>,
    /// New instant.
    pub date: Option<DateTime<Utc>>,
    /// New note.
    pub note: Option<String>,
}

impl TransactionPatch {
    /// Whether the base-currency amount must be derived again.
    #[must_use]
    pub const fn needs_conversion(&self) -> bool {
        self.amount.is_some() || self.currency.is_some()
    }
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the user's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> Result<Vec<TransactionView>, DbErr> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.as_str()))
            .find_also_related(categories::Entity)
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(tx, category)| {
                category.map(|category| TransactionView::from_models(tx, &category))
            })
            .collect())
    }

    /// Finds one of the user's transactions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist or belongs to
    /// another user.
    pub async fn find(&self, user_id: &UserId, id: i32) -> Result<TransactionView, TransactionError> {
        let (tx, category) = transactions::Entity::find_by_id(id)
            .filter(transactions::Column::UserId.eq(user_id.as_str()))
            .find_also_related(categories::Entity)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        let category = category.ok_or(TransactionError::CategoryNotFound(tx.category_id))?;
        Ok(TransactionView::from_models(tx, &category))
    }

    async fn usable_category(
        &self,
        user_id: &UserId,
        category_id: i32,
    ) -> Result<categories::Model, TransactionError> {
        find_usable_category(&self.db, user_id, category_id)
            .await?
            .ok_or(TransactionError::CategoryNotFound(category_id))
    }

    async fn base_currency(&self, user_id: &UserId, default: &CurrencyCode) -> Result<String, DbErr> {
        Ok(users::Entity::find_by_id(user_id.as_str().to_string())
            .one(&self.db)
            .await?
            .map_or_else(|| default.as_str().to_string(), |user| user.base_currency))
    }

    /// Records a transaction, converting it into the user's base currency.
    ///
    /// The settings row is created with `default_currency` if missing.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` if the category is not usable by the user.
    pub async fn create<R>(
        &self,
        user_id: &UserId,
        input: NewTransaction,
        rates: &R,
        default_currency: &CurrencyCode,
    ) -> Result<TransactionView, TransactionError>
    where
        R: RateLookup + ?Sized,
    {
        insert_user_if_missing(&self.db, user_id, default_currency).await?;
        let base = self.base_currency(user_id, default_currency).await?;
        let category = self.usable_category(user_id, input.category_id).await?;

        let original = round_money(input.amount);
        let amount = rates.convert(original, input.currency.as_str(), &base);

        let row = transactions::ActiveModel {
            user_id: Set(user_id.as_str().to_string()),
            amount: Set(amount),
            original_amount: Set(Some(original)),
            currency: Set(input.currency.as_str().to_string()),
            date: Set(input.date.into()),
            category_id: Set(category.id),
            note: Set(input.note),
            ..Default::default()
        };

        let created = row.insert(&self.db).await?;

        debug!(
            user_id = %user_id,
            transaction_id = created.id,
            from = %input.currency,
            to = %base,
            %amount,
            "Transaction recorded"
        );

        Ok(TransactionView::from_models(created, &category))
    }

    /// Applies a partial update.
    ///
    /// When the amount or currency changes, `amount` is derived again from
    /// the recorded value at the current rate.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown transactions and `CategoryNotFound` for
    /// unusable categories.
    pub async fn update<R>(
        &self,
        user_id: &UserId,
        id: i32,
        patch: TransactionPatch,
        rates: &R,
        default_currency: &CurrencyCode,
    ) -> Result<TransactionView, TransactionError>
    where
        R: RateLookup + ?Sized,
    {
        let existing = transactions::Entity::find_by_id(id)
            .filter(transactions::Column::UserId.eq(user_id.as_str()))
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        let category_id = patch.category_id.unwrap_or(existing.category_id);
        let category = self.usable_category(user_id, category_id).await?;
        let needs_conversion = patch.needs_conversion();

        let stored = stored_amounts(&existing);
        let (recorded, recorded_currency) = stored.source();
        let original = patch.amount.map_or(recorded, round_money);
        let currency = patch
            .currency
            .map_or_else(|| recorded_currency.to_string(), String::from);

        let mut active: transactions::ActiveModel = existing.into();

        if needs_conversion {
            let base = self.base_currency(user_id, default_currency).await?;
            let amount = rates.convert(original, &currency, &base);
            active.original_amount = Set(Some(original));
            active.currency = Set(currency);
            active.amount = Set(amount);
        }
        if patch.category_id.is_some() {
            active.category_id = Set(category.id);
        }
        if let Some(date) = patch.date {
            active.date = Set(date.into());
        }
        if let Some(note) = patch.note {
            active.note = Set(Some(note));
        }

        let updated = active.update(&self.db).await?;
        Ok(TransactionView::from_models(updated, &category))
    }

    /// Deletes one of the user's transactions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing was deleted.
    pub async fn delete(&self, user_id: &UserId, id: i32) -> Result<(), TransactionError> {
        let result = transactions::Entity::delete_many()
            .filter(transactions::Column::Id.eq(id))
            .filter(transactions::Column::UserId.eq(user_id.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(TransactionError::NotFound(id));
        }
        Ok(())
    }

    /// `(kind, amount)` of every transaction of the user, for the balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance_rows(&self, user_id: &UserId) -> Result<Vec<(CategoryKind, Decimal)>, DbErr> {
        let rows: Vec<(Decimal, CategoryType)> = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.as_str()))
            .join(JoinType::InnerJoin, transactions::Relation::Categories.def())
            .select_only()
            .column(transactions::Column::Amount)
            .column(categories::Column::Kind)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(amount, kind)| (kind.into(), amount))
            .collect())
    }
}
