//! Read-only queries behind the analytics and advice endpoints.
//!
//! Queries return plain rows; sums and buckets are computed by
//! `sana_core::analytics` so the arithmetic stays in one place.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use sana_core::advice::ExpenseDetail;
use sana_core::analytics::CategoryKind;
use sana_shared::types::UserId;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Select,
};

use crate::entities::{categories, sea_orm_active_enums::CategoryType, transactions};

/// Number of expenses listed in the advice prompt.
pub const TOP_EXPENSES_LIMIT: u64 = 20;

/// Analytics repository.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    db: DatabaseConnection,
}

impl AnalyticsRepository {
    /// Creates a new analytics repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn user_rows(user_id: &UserId, since: Option<DateTime<Utc>>) -> Select<transactions::Entity> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.as_str()))
            .join(JoinType::InnerJoin, transactions::Relation::Categories.def());
        if let Some(since) = since {
            query = query.filter(transactions::Column::Date.gte(since));
        }
        query
    }

    /// `(category name, amount)` of one kind since `since` (all time if `None`).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn category_amounts(
        &self,
        user_id: &UserId,
        kind: CategoryKind,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, Decimal)>, DbErr> {
        Self::user_rows(user_id, since)
            .filter(categories::Column::Kind.eq(CategoryType::from(kind)))
            .select_only()
            .column(categories::Column::Name)
            .column(transactions::Column::Amount)
            .into_tuple()
            .all(&self.db)
            .await
    }

    /// `(instant, kind, amount)` of every transaction in `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn kind_amounts_between(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, CategoryKind, Decimal)>, DbErr> {
        let rows: Vec<(DateTime<FixedOffset>, CategoryType, Decimal)> =
            Self::user_rows(user_id, Some(start))
                .filter(transactions::Column::Date.lt(end))
                .select_only()
                .column(transactions::Column::Date)
                .column(categories::Column::Kind)
                .column(transactions::Column::Amount)
                .into_tuple()
                .all(&self.db)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(date, kind, amount)| (date.with_timezone(&Utc), kind.into(), amount))
            .collect())
    }

    /// `(category name, kind, amount)` since `since`, for the advice prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn advice_rows(
        &self,
        user_id: &UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, CategoryKind, Decimal)>, DbErr> {
        let rows: Vec<(String, CategoryType, Decimal)> = Self::user_rows(user_id, since)
            .select_only()
            .column(categories::Column::Name)
            .column(categories::Column::Kind)
            .column(transactions::Column::Amount)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(name, kind, amount)| (name, kind.into(), amount))
            .collect())
    }

    /// The largest expenses since `since`, biggest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn top_expenses(
        &self,
        user_id: &UserId,
        since: Option<DateTime<Utc>>,
        limit: u64,
    ) -> Result<Vec<ExpenseDetail>, DbErr> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.as_str()))
            .find_also_related(categories::Entity)
            .filter(categories::Column::Kind.eq(CategoryType::Expense));
        if let Some(since) = since {
            query = query.filter(transactions::Column::Date.gte(since));
        }

        let rows = query
            .order_by_desc(transactions::Column::Amount)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(tx, category)| {
                category.map(|category| ExpenseDetail {
                    date: tx.date.with_timezone(&Utc),
                    amount: tx.amount,
                    original_amount: tx.original_amount,
                    currency: tx.currency,
                    category: category.name,
                    note: tx.note,
                })
            })
            .collect())
    }
}
