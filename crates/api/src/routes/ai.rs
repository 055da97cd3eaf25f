//! AI advice routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::post,
};
use chrono::Utc;
use sana_core::advice::{AdviceInput, PromptKind};
use sana_core::analytics::Period;
use sana_db::repositories::TOP_EXPENSES_LIMIT;
use sana_db::{AnalyticsRepository, UserRepository};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extractors::ClientTimezone;
use crate::{AppState, middleware::AuthUser};

/// Creates the AI routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ai/advice", post(get_advice))
}

/// Query parameters for advice.
#[derive(Debug, Deserialize)]
pub struct AdviceQuery {
    /// Period to analyse.
    #[serde(default = "default_range")]
    pub range: String,
    /// `advice`, `summary` or `anomaly`.
    #[serde(default)]
    pub prompt_type: Option<String>,
}

fn default_range() -> String {
    "month".to_string()
}

/// Advice response.
#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    /// Model output, or the empty-period message.
    pub advice: String,
}

/// POST `/ai/advice` - Advice on the user's spending in a period.
async fn get_advice(
    State(state): State<AppState>,
    auth: AuthUser,
    ClientTimezone(offset): ClientTimezone,
    Query(query): Query<AdviceQuery>,
) -> ApiResult<Json<AdviceResponse>> {
    let Some(advisor) = state.advisor.as_ref() else {
        return Err(ApiError::unavailable("AI Service unavailable (No API Key)"));
    };

    let user_id = auth.user_id();
    let currency = UserRepository::new((*state.db).clone())
        .base_currency(&user_id, &state.default_currency)
        .await?;

    let since = Period::parse(&query.range).start_utc(Utc::now(), offset);
    let analytics = AnalyticsRepository::new((*state.db).clone());
    let rows = analytics.advice_rows(&user_id, since).await?;
    let top = analytics
        .top_expenses(&user_id, since, TOP_EXPENSES_LIMIT)
        .await?;

    let kind = PromptKind::parse(query.prompt_type.as_deref().unwrap_or_default());
    let input = AdviceInput::from_rows(&rows, top);

    let advice = advisor
        .advise(kind, &query.range, &input, &currency)
        .await
        .map_err(|_| ApiError::unavailable("AI is currently busy"))?;

    Ok(Json(AdviceResponse { advice }))
}
