//! Transaction routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sana_core::analytics::{AnalyticsService, resolve_transaction_date};
use sana_db::TransactionRepository;
use sana_db::repositories::{NewTransaction, TransactionPatch, TransactionView};
use sana_shared::types::{CurrencyCode, PageRequest};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extractors::ClientTimezone;
use crate::{AppState, middleware::AuthUser};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/transactions/{transaction_id}",
            patch(update_transaction).delete(delete_transaction),
        )
        .route("/balance", get(get_balance))
}

/// Request for recording a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Amount paid, in `currency`.
    pub amount: Decimal,
    /// Currency of `amount`.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Category ID.
    pub category_id: i32,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    /// Optional note.
    #[serde(default)]
    pub note: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTransactionRequest {
    /// New amount, in the (possibly new) currency.
    pub amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<String>,
    /// New category ID.
    pub category_id: Option<i32>,
    /// New date.
    pub date: Option<String>,
    /// New note.
    pub note: Option<String>,
}

fn parse_currency(raw: &str) -> Result<CurrencyCode, ApiError> {
    CurrencyCode::parse(raw).map_err(|e| ApiError::validation(e.to_string()))
}

/// GET `/transactions` - Newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<Vec<TransactionView>>> {
    let repo = TransactionRepository::new((*state.db).clone());
    Ok(Json(repo.list(&auth.user_id(), &page).await?))
}

/// POST `/transactions` - Record a transaction in the user's base currency.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ClientTimezone(offset): ClientTimezone,
    Json(payload): Json<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<TransactionView>)> {
    let currency = parse_currency(&payload.currency)?;
    let date = resolve_transaction_date(payload.date.as_deref(), offset, Utc::now());

    let user_id = auth.user_id();
    let repo = TransactionRepository::new((*state.db).clone());
    let created = repo
        .create(
            &user_id,
            NewTransaction {
                amount: payload.amount,
                currency,
                category_id: payload.category_id,
                date,
                note: payload.note,
            },
            state.currency.as_ref(),
            &state.default_currency,
        )
        .await?;

    info!(user_id = %user_id, transaction_id = created.id, "Transaction created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH `/transactions/{transaction_id}` - Partial edit.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ClientTimezone(offset): ClientTimezone,
    Path(transaction_id): Path<i32>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> ApiResult<Json<TransactionView>> {
    let currency = payload.currency.as_deref().map(parse_currency).transpose()?;
    let date = payload
        .date
        .as_deref()
        .map(|raw| resolve_transaction_date(Some(raw), offset, Utc::now()));

    let repo = TransactionRepository::new((*state.db).clone());
    let updated = repo
        .update(
            &auth.user_id(),
            transaction_id,
            TransactionPatch {
                amount: payload.amount,
                currency,
                category_id: payload.category_id,
                date,
                note: payload.note,
            },
            state.currency.as_ref(),
            &state.default_currency,
        )
        .await?;

    Ok(Json(updated))
}

/// DELETE `/transactions/{transaction_id}`.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<i32>,
) -> ApiResult<Json<Value>> {
    let repo = TransactionRepository::new((*state.db).clone());
    repo.delete(&auth.user_id(), transaction_id).await?;
    Ok(Json(json!({ "status": "deleted" })))
}

/// GET `/balance` - Income minus expense in the base currency.
async fn get_balance(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Value>> {
    let repo = TransactionRepository::new((*state.db).clone());
    let rows = repo.balance_rows(&auth.user_id()).await?;
    Ok(Json(json!({ "balance": AnalyticsService::net_balance(&rows) })))
}
