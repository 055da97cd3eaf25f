//! Category routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use sana_core::analytics::CategoryKind;
use sana_core::category::normalize_category_name;
use sana_db::CategoryRepository;
use sana_db::entities::categories;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::AuthUser};

/// Creates the category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{category_id}", delete(delete_category))
        .route("/categories/{category_id}/check", get(check_usage))
}

/// Query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    /// `income` or `expense`; both when absent.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Request for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Display name.
    pub name: String,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Response for a category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Category ID.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// Owner; `null` for shared categories.
    pub user_id: Option<String>,
}

impl From<categories::Model> for CategoryResponse {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            kind: model.kind.into(),
            user_id: model.user_id,
        }
    }
}

fn parse_kind(raw: &str) -> Result<CategoryKind, ApiError> {
    CategoryKind::from_str(raw).map_err(|e| ApiError::validation(e.to_string()))
}

/// GET `/categories` - Active categories, seeding the defaults on first use.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListCategoriesQuery>,
) -> ApiResult<Json<Vec<CategoryResponse>>> {
    let kind = query
        .kind
        .as_deref()
        .filter(|k| !k.is_empty())
        .map(parse_kind)
        .transpose()?;

    let user_id = auth.user_id();
    let repo = CategoryRepository::new((*state.db).clone());
    repo.seed_defaults_if_empty(&user_id, &state.default_currency, &state.category_seed_lock)
        .await?;

    let categories = repo.list(&user_id, kind.map(Into::into)).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// POST `/categories` - Create a category or reactivate a deleted one.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let name = normalize_category_name(&payload.name)
        .ok_or_else(|| ApiError::validation("Category name must be 1-64 characters"))?;
    let kind = parse_kind(&payload.kind)?;

    let user_id = auth.user_id();
    let repo = CategoryRepository::new((*state.db).clone());
    let category = repo
        .upsert(&user_id, &state.default_currency, &name, kind.into())
        .await?;

    info!(user_id = %user_id, category_id = category.id, "Category created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": category.id, "status": "created" })),
    ))
}

/// DELETE `/categories/{category_id}` - Deactivate a category and drop its transactions.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<i32>,
) -> ApiResult<Json<Value>> {
    let repo = CategoryRepository::new((*state.db).clone());
    let removed = repo.delete(&auth.user_id(), category_id).await?;

    Ok(Json(json!({
        "status": "deleted",
        "deleted_transactions": removed
    })))
}

/// GET `/categories/{category_id}/check` - How many transactions would be removed.
async fn check_usage(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<i32>,
) -> ApiResult<Json<Value>> {
    let repo = CategoryRepository::new((*state.db).clone());
    let count = repo.usage_count(&auth.user_id(), category_id).await?;

    Ok(Json(json!({ "transaction_count": count })))
}
