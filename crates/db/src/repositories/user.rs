//! User and settings repository.

use sana_core::currency::RateLookup;
use sana_core::recalculation::{RecalculationReport, Recalculator};
use sana_shared::types::{CurrencyCode, UserId};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{error, info};

use super::recalculation::SeaRecalculationStore;
use crate::entities::{categories, transactions, users};

/// Rows removed by [`UserRepository::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    /// Deleted transactions.
    pub transactions: u64,
    /// Deleted categories.
    pub categories: u64,
    /// Whether the settings row existed.
    pub user_deleted: bool,
}

/// Inserts the user's row with `default_currency` unless it already exists.
pub(crate) async fn insert_user_if_missing<C: ConnectionTrait>(
    conn: &C,
    user_id: &UserId,
    default_currency: &CurrencyCode,
) -> Result<(), DbErr> {
    let row = users::ActiveModel {
        id: Set(user_id.as_str().to_string()),
        base_currency: Set(default_currency.as_str().to_string()),
        created_at: Set(chrono::Utc::now().into()),
    };

    users::Entity::insert(row)
        .on_conflict(
            OnConflict::column(users::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    pub async fn find_by_id(&self, user_id: &UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(user_id.as_str().to_string())
            .one(&self.db)
            .await
    }

    /// Returns the user's row, creating it with `default_currency` first if needed.
    pub async fn ensure_exists(
        &self,
        user_id: &UserId,
        default_currency: &CurrencyCode,
    ) -> Result<users::Model, DbErr> {
        insert_user_if_missing(&self.db, user_id, default_currency).await?;
        self.find_by_id(user_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")))
    }

    /// The user's base currency, or `default_currency` when no row exists.
    pub async fn base_currency(
        &self,
        user_id: &UserId,
        default_currency: &CurrencyCode,
    ) -> Result<String, DbErr> {
        Ok(self
            .find_by_id(user_id)
            .await?
            .map_or_else(|| default_currency.as_str().to_string(), |user| user.base_currency))
    }

    /// Changes the base currency and recalculates every transaction amount.
    ///
    /// Runs in one database transaction: either the new currency and all
    /// rewritten amounts are committed together, or nothing is.
    pub async fn change_base_currency<R>(
        &self,
        user_id: &UserId,
        new_currency: &CurrencyCode,
        rates: &R,
        recalculator: &Recalculator,
    ) -> Result<RecalculationReport, DbErr>
    where
        R: RateLookup + ?Sized,
    {
        let txn = self.db.begin().await?;
        let store = SeaRecalculationStore::new(&txn);

        let result = recalculator
            .change_base_currency(&store, rates, user_id, new_currency)
            .await;

        match result {
            Ok(report) => {
                txn.commit().await?;
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, user_id = %user_id, "Recalculation failed; rolling back");
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    /// Deletes the user's transactions, categories and settings row.
    pub async fn reset(&self, user_id: &UserId) -> Result<ResetSummary, DbErr> {
        let txn = self.db.begin().await?;

        let transactions = transactions::Entity::delete_many()
            .filter(transactions::Column::UserId.eq(user_id.as_str()))
            .exec(&txn)
            .await?
            .rows_affected;

        let categories = categories::Entity::delete_many()
            .filter(categories::Column::UserId.eq(user_id.as_str()))
            .exec(&txn)
            .await?
            .rows_affected;

        let user_deleted = users::Entity::delete_by_id(user_id.as_str().to_string())
            .exec(&txn)
            .await?
            .rows_affected
            > 0;

        txn.commit().await?;

        info!(
            user_id = %user_id,
            transactions,
            categories,
            "User data reset"
        );

        Ok(ResetSummary {
            transactions,
            categories,
            user_deleted,
        })
    }
}
