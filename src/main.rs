use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use reel_recs::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_store, KeyValueStore, MemoryStore},
    services::{
        providers::TmdbProvider, PipelineSettings, RecommendationService, Session, SignalBus,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reel_recs=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => Arc::new(create_redis_store(url).await?),
        None => {
            tracing::warn!("REDIS_URL not set, recommendation state will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    let catalog = TmdbProvider::new(
        config.catalog_api_key.clone(),
        config.catalog_api_url.clone(),
        config.catalog_timeout(),
    )?;

    let bus = SignalBus::default();
    let service = Arc::new(RecommendationService::new(
        store,
        Arc::new(catalog),
        bus.clone(),
        Session::new(bus),
        PipelineSettings::from(&config),
    ));
    let pipeline = service.start();

    let app = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Server running");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pipeline.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
