//! Database-backed [`RecalculationStore`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use sana_core::recalculation::{RecalculationStore, StoredAmounts};
use sana_shared::types::{CurrencyCode, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use super::user::insert_user_if_missing;
use crate::entities::{transactions, users};

/// Runs the recalculation protocol against one connection.
///
/// Pass a `DatabaseTransaction` so every read and write shares one unit of
/// work; the caller commits or rolls back.
pub struct SeaRecalculationStore<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SeaRecalculationStore<'a, C> {
    /// Wraps `conn`.
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C: ConnectionTrait> RecalculationStore for SeaRecalculationStore<'_, C> {
    type Error = DbErr;

    async fn load_or_create_base_currency(
        &self,
        user_id: &UserId,
        default: &CurrencyCode,
    ) -> Result<String, DbErr> {
        insert_user_if_missing(self.conn, user_id, default).await?;

        let base: Option<String> = users::Entity::find_by_id(user_id.as_str().to_string())
            .select_only()
            .column(users::Column::BaseCurrency)
            .into_tuple()
            .one(self.conn)
            .await?;

        base.ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")))
    }

    async fn set_base_currency(&self, user_id: &UserId, code: &CurrencyCode) -> Result<(), DbErr> {
        users::Entity::update_many()
            .col_expr(users::Column::BaseCurrency, Expr::value(code.as_str()))
            .filter(users::Column::Id.eq(user_id.as_str()))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    async fn transactions_after(
        &self,
        user_id: &UserId,
        after: Option<i32>,
        limit: u64,
    ) -> Result<Vec<StoredAmounts>, DbErr> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id.as_str()));
        if let Some(after) = after {
            query = query.filter(transactions::Column::Id.gt(after));
        }

        let rows: Vec<(i32, Decimal, Option<Decimal>, String)> = query
            .order_by_asc(transactions::Column::Id)
            .limit(limit)
            .select_only()
            .column(transactions::Column::Id)
            .column(transactions::Column::Amount)
            .column(transactions::Column::OriginalAmount)
            .column(transactions::Column::Currency)
            .into_tuple()
            .all(self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, amount, original_amount, currency)| StoredAmounts {
                id,
                amount,
                original_amount,
                currency,
            })
            .collect())
    }

    async fn write_amount(&self, transaction_id: i32, amount: Decimal) -> Result<(), DbErr> {
        transactions::Entity::update_many()
            .col_expr(transactions::Column::Amount, Expr::value(amount))
            .filter(transactions::Column::Id.eq(transaction_id))
            .exec(self.conn)
            .await?;
        Ok(())
    }
}
