use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use threadcast::{api, config::Config, rate_limit, seed, state::AppState, store::MemoryStore};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "threadcast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting threadcast...");

    let config = Config::from_env();
    let addr = config.socket_addr();

    let store = Arc::new(MemoryStore::new());
    if let Err(e) = seed::seed(&*store, &config).await {
        tracing::warn!("Seeding failed, starting with an empty board: {}", e);
    }

    let limiter = config
        .rate_limit
        .as_ref()
        .map(rate_limit::RateLimiter::from_config);
    if let Some(limiter) = &limiter {
        rate_limit::spawn_cleanup(limiter.clone());
    }

    let state = Arc::new(AppState::with_store(store, config));
    let app = api::router(state, limiter);

    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {}", e);
    }
}
