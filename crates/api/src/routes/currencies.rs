//! Exchange-rate routes.

use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{AppState, middleware::AuthUser};

/// Creates the currency routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/currencies/rates", get(list_rates))
}

/// Cached quotes against the reference currency.
#[derive(Debug, Serialize)]
pub struct RatesResponse {
    /// Reference currency.
    pub reference: String,
    /// When the snapshot was fetched; `null` if nothing is cached.
    pub last_updated: Option<DateTime<Utc>>,
    /// Units of each currency per one unit of `reference`.
    pub rates: BTreeMap<String, Decimal>,
}

/// GET `/currencies/rates` - Cached rates, fetching first if the cache is empty.
async fn list_rates(State(state): State<AppState>, _auth: AuthUser) -> Json<RatesResponse> {
    let snapshot = state.currency.all_rates().await;

    Json(match snapshot {
        Some(snapshot) => RatesResponse {
            reference: snapshot.reference().to_string(),
            last_updated: Some(snapshot.fetched_at()),
            rates: snapshot
                .values()
                .iter()
                .map(|(code, value)| (code.clone(), *value))
                .collect(),
        },
        None => RatesResponse {
            reference: state.currency.reference().to_string(),
            last_updated: None,
            rates: BTreeMap::new(),
        },
    })
}
