//! Enum columns.

use sana_core::analytics::CategoryKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `categories.type`, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Money received.
    #[sea_orm(string_value = "income")]
    Income,
    /// Money spent.
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl From<CategoryType> for CategoryKind {
    fn from(value: CategoryType) -> Self {
        match value {
            CategoryType::Income => Self::Income,
            CategoryType::Expense => Self::Expense,
        }
    }
}

impl From<CategoryKind> for CategoryType {
    fn from(value: CategoryKind) -> Self {
        match value {
            CategoryKind::Income => Self::Income,
            CategoryKind::Expense => Self::Expense,
        }
    }
}
