//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api`
//! - Telegram init-data authentication middleware
//! - Request extractors
//! - Error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sana_core::advice::AdviceService;
use sana_core::currency::CurrencyService;
use sana_core::recalculation::Recalculator;
use sana_shared::InitDataVerifier;
use sana_shared::types::CurrencyCode;
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Currency conversion over the shared rate cache.
    pub currency: Arc<CurrencyService>,
    /// Init-data verifier; `None` when no bot token is configured.
    pub verifier: Option<Arc<InitDataVerifier>>,
    /// AI advice; `None` when no API key is configured.
    pub advisor: Option<AdviceService>,
    /// Serializes first-time category seeding.
    pub category_seed_lock: Arc<Mutex<()>>,
    /// Base-currency recalculation settings.
    pub recalculator: Arc<Recalculator>,
    /// Base currency for users without a settings row.
    pub default_currency: CurrencyCode,
}

impl AppState {
    /// Creates state with a fresh seeding lock.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        currency: Arc<CurrencyService>,
        verifier: Option<InitDataVerifier>,
        advisor: Option<AdviceService>,
        default_currency: CurrencyCode,
    ) -> Self {
        Self {
            db: Arc::new(db),
            currency,
            verifier: verifier.map(Arc::new),
            advisor,
            category_seed_lock: Arc::new(Mutex::new(())),
            recalculator: Arc::new(Recalculator::new(default_currency.clone())),
            default_currency,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
