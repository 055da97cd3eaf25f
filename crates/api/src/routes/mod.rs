//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::telegram_auth_middleware};

pub mod ai;
pub mod analytics;
pub mod categories;
pub mod currencies;
pub mod health;
pub mod transactions;
pub mod users;

/// Creates the API router; everything except health requires init data.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(categories::routes())
        .merge(transactions::routes())
        .merge(analytics::routes())
        .merge(ai::routes())
        .merge(currencies::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            telegram_auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
