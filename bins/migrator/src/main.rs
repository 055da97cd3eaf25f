//! Database migration runner for Sana.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! The database URL comes from `DATABASE_URL`, falling back to the
//! application configuration (`SANA__DATABASE__URL`, `config/*.toml`).

use anyhow::{Context, bail};
use sana_db::migration::{Migrator, MigratorTrait};
use sana_shared::AppConfig;
use tracing::info;

fn database_url() -> anyhow::Result<String> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Ok(url);
    }
    let config = AppConfig::load().context("DATABASE_URL is unset and configuration failed to load")?;
    Ok(config.database.url)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    let db = sana_db::connect(&database_url()?).await?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => bail!("unknown command '{other}' (expected up, down, status or fresh)"),
    }

    info!(command = %command, "Migration command finished");
    Ok(())
}
