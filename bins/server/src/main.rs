//! Sana API Server
//!
//! Composition root: configuration, tracing, database, the shared rate cache
//! and its background refresher, then the HTTP listener.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sana_api::{AppState, create_router};
use sana_core::advice::{AdviceService, GeminiClient};
use sana_core::currency::{CurrencyService, RateRefresher};
use sana_db::connect_with;
use sana_shared::types::CurrencyCode;
use sana_shared::{AppConfig, InitDataVerifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sana=debug,sana_core=debug,sana_db=info,sana_api=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let default_currency = CurrencyCode::parse(&config.users.default_base_currency)
        .context("Invalid users.default_base_currency")?;

    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let currency = Arc::new(CurrencyService::from_config(&config.rates)?);
    if currency.warm_up().await {
        info!(reference = %currency.reference(), "Exchange rates loaded");
    }

    let shutdown = CancellationToken::new();
    let refresher = RateRefresher::new(
        Arc::clone(&currency),
        Duration::from_secs(config.rates.refresh_interval_secs),
    )
    .spawn(shutdown.clone());

    let verifier = config
        .telegram
        .bot_token()
        .map(|token| InitDataVerifier::new(token, config.telegram.max_auth_age_secs))
        .transpose()?;
    if verifier.is_none() {
        warn!("No Telegram bot token configured; authenticated routes will fail");
    }

    let advisor = match config.ai.api_key() {
        Some(key) => {
            let client = GeminiClient::new(
                config.ai.base_url.clone(),
                config.ai.model.clone(),
                key,
                Duration::from_secs(config.ai.request_timeout_secs),
            )?;
            info!(model = %config.ai.model, "AI advice enabled");
            Some(AdviceService::new(Arc::new(client)))
        }
        None => {
            warn!("No AI API key configured; advice endpoint answers 503");
            None
        }
    };

    let state = AppState::new(db, currency, verifier, advisor, default_currency);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    refresher.await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for ctrl-c");
            }
            info!("Shutdown signal received");
        }
        () = token.cancelled() => {}
    }
}
