//! Traffic Accident Risk Portal server

use std::path::PathBuf;
use std::sync::Arc;

use accident_portal::{
    auth::SessionKeys, build_router, config::PortalConfig, store::SqliteStore, AppState,
};
use anyhow::Context;
use clap::Parser;
use risk_inference::RiskEngine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "accident-portal")]
#[command(about = "Traffic accident risk portal", long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, env = "PORTAL_CONFIG", default_value = "portal.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = PortalConfig::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;

    let store = Arc::new(
        SqliteStore::connect(&config.database_url)
            .await
            .context("failed to open database")?,
    );
    store.migrate().await.context("failed to run migrations")?;
    tracing::info!("Database ready at {}", config.database_url);

    let engine = RiskEngine::load(&config.model_dir).context("failed to load risk model")?;

    let sessions = match &config.session_secret {
        Some(secret) => SessionKeys::new(secret.as_bytes(), config.session_ttl_hours),
        None => {
            tracing::warn!("session_secret not configured; using a random key, sessions end on restart");
            SessionKeys::random(config.session_ttl_hours)
        }
    };

    let state = AppState {
        users: store.clone(),
        predictions: store,
        engine: Arc::new(engine),
        sessions: Arc::new(sessions),
        limits: config.limits(),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Portal listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
