use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stardash::{
    api,
    config::{GameConfig, ServerConfig},
    engine::RoundEngine,
    reaper,
    source::{GitHubSource, SourceConfig},
    store::{FileStore, MemoryStore, RoundStore},
};

/// How often the reaper sweeps the store
const REAP_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stardash=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Stardash...");

    let game_config = GameConfig::from_env();
    let server_config = ServerConfig::from_env();
    let source_config = SourceConfig::from_env();

    tracing::info!(
        source = %source_config.api_url,
        authenticated = source_config.token.is_some(),
        "Candidate source configured"
    );

    let source = Arc::new(GitHubSource::new(source_config)?);

    let store: Arc<dyn RoundStore> = match &server_config.store_path {
        Some(path) => {
            let store = FileStore::open(path).await?;
            tracing::info!(path = %store.path().display(), "Using file-backed round store");
            Arc::new(store)
        }
        None => {
            tracing::info!("Using in-memory round store");
            Arc::new(MemoryStore::new())
        }
    };

    reaper::spawn_round_reaper(store.clone(), REAP_INTERVAL, game_config.reaper_grace);

    let engine = Arc::new(RoundEngine::new(source, store, game_config));

    let mut app = api::router(engine);
    if let Some(dir) = &server_config.static_dir {
        tracing::info!(dir = %dir.display(), "Serving static files");
        app = app.fallback_service(ServeDir::new(dir));
    }

    let listener = tokio::net::TcpListener::bind(server_config.addr).await?;
    tracing::info!("Listening on http://{}", server_config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Stopping server...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
