use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::sync::Arc;

mod cache;
mod config;
mod feed;
mod filter;
mod routes;

use cache::SnapshotCache;
use config::Config;
use feed::fetcher::HttpFeedFetcher;
use routes::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busao_rj_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let fetcher = HttpFeedFetcher::new(&config)?;
    tracing::info!(
        upstream = fetcher.url(),
        ttl_secs = cache::SNAPSHOT_TTL.as_secs(),
        "Vehicle feed configured"
    );
    let cache = Arc::new(SnapshotCache::new(Arc::new(fetcher)));

    let bind_addr = config.bind_addr;
    let state = AppState {
        config: Arc::new(config),
        cache,
    };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server starting on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
