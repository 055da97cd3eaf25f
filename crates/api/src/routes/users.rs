//! User profile and settings routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};
use sana_core::recalculation::RecalculationReport;
use sana_db::UserRepository;
use sana_shared::types::CurrencyCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::AuthUser};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_profile))
        .route("/users/me/settings/currency", post(update_base_currency))
        .route("/users/me/reset", delete(reset_user_data))
}

/// Profile response.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Telegram user ID.
    pub id: String,
    /// Base currency.
    pub base_currency: String,
}

/// Request for changing the base currency.
#[derive(Debug, Deserialize)]
pub struct CurrencySettingsRequest {
    /// New three-letter base currency.
    pub base_currency: String,
}

/// GET `/users/me` - Profile, with the default currency if no row exists.
async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let user_id = auth.user_id();
    let repo = UserRepository::new((*state.db).clone());
    let base_currency = repo
        .base_currency(&user_id, &state.default_currency)
        .await?;

    Ok(Json(ProfileResponse {
        id: user_id.into_inner(),
        base_currency,
    }))
}

/// POST `/users/me/settings/currency` - Change base currency and recalculate.
async fn update_base_currency(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CurrencySettingsRequest>,
) -> ApiResult<Json<RecalculationReport>> {
    let new_currency = CurrencyCode::parse(&payload.base_currency)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let user_id = auth.user_id();
    let repo = UserRepository::new((*state.db).clone());
    let report = repo
        .change_base_currency(
            &user_id,
            &new_currency,
            state.currency.as_ref(),
            &state.recalculator,
        )
        .await?;

    Ok(Json(report))
}

/// DELETE `/users/me/reset` - Delete all of the user's data.
async fn reset_user_data(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Value>> {
    let user_id = auth.user_id();
    let repo = UserRepository::new((*state.db).clone());
    repo.reset(&user_id).await?;
    Ok(Json(json!({ "status": "success" })))
}
