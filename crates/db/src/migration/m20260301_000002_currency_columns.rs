//! Multi-currency columns and soft-deletable categories.
//!
//! Rows written before this migration keep `original_amount = NULL`; readers
//! fall back to `amount` for them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CURRENCY_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "ALTER TABLE categories DROP CONSTRAINT IF EXISTS uq_categories_name_type_user;
             ALTER TABLE categories DROP COLUMN IF EXISTS is_active;
             ALTER TABLE transactions DROP COLUMN IF EXISTS currency;
             ALTER TABLE transactions DROP COLUMN IF EXISTS original_amount;",
        )
        .await?;
        Ok(())
    }
}

const CURRENCY_SQL: &str = r"
ALTER TABLE transactions ADD COLUMN original_amount NUMERIC(12, 2);
ALTER TABLE transactions ADD COLUMN currency VARCHAR(3) NOT NULL DEFAULT 'USD';

ALTER TABLE categories ADD COLUMN is_active BOOLEAN NOT NULL DEFAULT TRUE;
ALTER TABLE categories
    ADD CONSTRAINT uq_categories_name_type_user UNIQUE (name, type, user_id);

-- Keyset scan used by base-currency recalculation
CREATE INDEX idx_transactions_user_id ON transactions(user_id, id);
";
