//! Probe API server.

use std::net::SocketAddr;
use std::sync::Arc;

use cache_store::{CacheStore, InMemoryCacheStore};
use database::Database;
use openrouter_analyst::OpenRouterAnalyst;
use pipeline::{HttpFetcher, SystemClock};
use probe_api::{AppState, Config, TokenVerifier};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting Probe API");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
    let analyst = OpenRouterAnalyst::from_env()?;
    let fetcher = HttpFetcher::new(config.fetch_timeout)?;

    // Build application state
    let state = AppState::new(
        db.clone(),
        cache,
        Arc::new(SystemClock),
        Arc::new(fetcher),
        Arc::new(analyst),
        TokenVerifier::new(&config.access_token_secret),
    )
    .with_trust_forwarded_for(config.trust_forwarded_for);

    let sweeper = state
        .limiter
        .spawn_sweeper(config.rate_limit_retention, config.rate_limit_sweep_every);

    // Start server
    let app = probe_api::app(state);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Probe API listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    sweeper.abort();
    db.close().await;
    Ok(())
}
