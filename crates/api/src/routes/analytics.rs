//! Analytics routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;
use sana_core::analytics::{
    AnalyticsService, CalendarReport, CategoryKind, CategoryTotal, Period, month_bounds_utc,
};
use sana_db::AnalyticsRepository;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extractors::ClientTimezone;
use crate::{AppState, middleware::AuthUser};

/// Creates the analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/summary", get(get_summary))
        .route("/analytics/calendar", get(get_calendar))
}

/// Query parameters for the category summary.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// `income` or `expense`.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    /// `day`, `week`, `month`, `year`; anything else is all time.
    #[serde(default = "default_range")]
    pub range: String,
}

fn default_kind() -> String {
    "expense".to_string()
}

fn default_range() -> String {
    "month".to_string()
}

/// Query parameters for the calendar.
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    /// Month, 1-12.
    pub month: u32,
    /// Year.
    pub year: i32,
}

/// GET `/analytics/summary` - Totals per category, largest first.
async fn get_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    ClientTimezone(offset): ClientTimezone,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<Vec<CategoryTotal>>> {
    let kind =
        CategoryKind::from_str(&query.kind).map_err(|e| ApiError::validation(e.to_string()))?;
    let since = Period::parse(&query.range).start_utc(Utc::now(), offset);

    let repo = AnalyticsRepository::new((*state.db).clone());
    let rows = repo.category_amounts(&auth.user_id(), kind, since).await?;

    Ok(Json(AnalyticsService::category_totals(&rows)))
}

/// GET `/analytics/calendar` - Day-by-day totals of a local month.
async fn get_calendar(
    State(state): State<AppState>,
    auth: AuthUser,
    ClientTimezone(offset): ClientTimezone,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CalendarReport>> {
    let (start, end) = month_bounds_utc(query.year, query.month, offset)
        .ok_or_else(|| ApiError::validation("Invalid month or year"))?;

    let repo = AnalyticsRepository::new((*state.db).clone());
    let rows = repo
        .kind_amounts_between(&auth.user_id(), start, end)
        .await?;

    Ok(Json(AnalyticsService::calendar(
        &rows,
        query.year,
        query.month,
        offset,
    )))
}
