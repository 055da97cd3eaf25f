//! Category repository.
//!
//! Categories are soft-deleted (`is_active = false`) so a category re-created
//! under the same name and type gets its old row back instead of violating
//! the `(name, type, user_id)` unique constraint.

use sana_core::category::DEFAULT_CATEGORIES;
use sana_shared::types::{CurrencyCode, UserId};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::user::insert_user_if_missing;
use crate::entities::{categories, sea_orm_active_enums::CategoryType, transactions};

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// The category is shared or owned by someone else.
    #[error("Cannot delete category {0}: access denied or default category")]
    Forbidden(i32),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

fn visible_to(user_id: &UserId) -> Condition {
    Condition::any()
        .add(categories::Column::UserId.eq(user_id.as_str()))
        .add(categories::Column::UserId.is_null())
}

/// Finds an active category the user may book transactions against:
/// one of their own or a shared one.
pub(crate) async fn find_usable_category<C: ConnectionTrait>(
    conn: &C,
    user_id: &UserId,
    category_id: i32,
) -> Result<Option<categories::Model>, DbErr> {
    categories::Entity::find_by_id(category_id)
        .filter(visible_to(user_id))
        .filter(categories::Column::IsActive.eq(true))
        .one(conn)
        .await
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the active categories visible to the user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: &UserId,
        kind: Option<CategoryType>,
    ) -> Result<Vec<categories::Model>, DbErr> {
        let mut query = categories::Entity::find()
            .filter(visible_to(user_id))
            .filter(categories::Column::IsActive.eq(true));

        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind));
        }

        query.order_by_asc(categories::Column::Id).all(&self.db).await
    }

    /// Number of categories the user owns, active or not.
    async fn owned_count(&self, user_id: &UserId) -> Result<u64, DbErr> {
        categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id.as_str()))
            .count(&self.db)
            .await
    }

    /// Seeds the default categories for a user who has none.
    ///
    /// The count is checked once without the lock and again while holding
    /// `seed_lock`, so concurrent first requests seed exactly once. Returns
    /// true if rows were inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn seed_defaults_if_empty(
        &self,
        user_id: &UserId,
        default_currency: &CurrencyCode,
        seed_lock: &Mutex<()>,
    ) -> Result<bool, DbErr> {
        if self.owned_count(user_id).await? > 0 {
            return Ok(false);
        }

        let _guard = seed_lock.lock().await;
        if self.owned_count(user_id).await? > 0 {
            debug!(user_id = %user_id, "Defaults seeded by a concurrent request");
            return Ok(false);
        }

        let txn = self.db.begin().await?;
        insert_user_if_missing(&txn, user_id, default_currency).await?;

        let rows = DEFAULT_CATEGORIES
            .iter()
            .map(|(name, kind)| categories::ActiveModel {
                name: Set((*name).to_string()),
                kind: Set((*kind).into()),
                user_id: Set(Some(user_id.as_str().to_string())),
                is_active: Set(true),
                ..Default::default()
            });

        categories::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    categories::Column::Name,
                    categories::Column::Kind,
                    categories::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        info!(user_id = %user_id, count = DEFAULT_CATEGORIES.len(), "Seeded default categories");
        Ok(true)
    }

    /// Creates a category, or reactivates the user's soft-deleted one with the
    /// same name and type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn upsert(
        &self,
        user_id: &UserId,
        default_currency: &CurrencyCode,
        name: &str,
        kind: CategoryType,
    ) -> Result<categories::Model, DbErr> {
        insert_user_if_missing(&self.db, user_id, default_currency).await?;

        let row = categories::ActiveModel {
            name: Set(name.to_string()),
            kind: Set(kind),
            user_id: Set(Some(user_id.as_str().to_string())),
            is_active: Set(true),
            ..Default::default()
        };

        categories::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    categories::Column::Name,
                    categories::Column::Kind,
                    categories::Column::UserId,
                ])
                .update_column(categories::Column::IsActive)
                .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await
    }

    /// Deactivates one of the user's categories and deletes its transactions.
    ///
    /// Returns the number of transactions removed.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for shared categories and categories of other users.
    pub async fn delete(&self, user_id: &UserId, category_id: i32) -> Result<u64, CategoryError> {
        let txn = self.db.begin().await?;

        let owned = categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id.as_str()))
            .one(&txn)
            .await?;
        if owned.is_none() {
            return Err(CategoryError::Forbidden(category_id));
        }

        let removed = transactions::Entity::delete_many()
            .filter(transactions::Column::CategoryId.eq(category_id))
            .filter(transactions::Column::UserId.eq(user_id.as_str()))
            .exec(&txn)
            .await?
            .rows_affected;

        categories::Entity::update_many()
            .col_expr(categories::Column::IsActive, Expr::value(false))
            .filter(categories::Column::Id.eq(category_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(user_id = %user_id, category_id, removed, "Category deactivated");
        Ok(removed)
    }

    /// Counts the user's transactions in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn usage_count(&self, user_id: &UserId, category_id: i32) -> Result<u64, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(category_id))
            .filter(transactions::Column::UserId.eq(user_id.as_str()))
            .count(&self.db)
            .await
    }
}
