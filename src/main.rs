use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use trendwatch_api::{
    config::Config,
    db::Cache,
    routes::{create_router, AppState},
    services::{
        providers::{AwardsProvider, OmdbAwardsProvider, TmdbProvider},
        CatalogFetcher, RecommendationService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trendwatch_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let (cache, cache_writer) =
        Cache::from_url(config.redis_url.as_deref(), config.memory_cache_capacity).await?;

    let catalog = TmdbProvider::new(
        cache.clone(),
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.watch_region.clone(),
    )
    .with_cache_ttls(config.trending_cache_ttl, config.availability_cache_ttl)
    .with_rate_limit(config.tmdb_requests_per_second);

    let awards = config.omdb_api_key.clone().map(|key| {
        Arc::new(OmdbAwardsProvider::new(
            cache.clone(),
            key,
            config.omdb_api_url.clone(),
        )) as Arc<dyn AwardsProvider>
    });
    if awards.is_none() {
        tracing::info!("OMDB_API_KEY not set, award enrichment disabled");
    }

    let fetcher = CatalogFetcher::new(Arc::new(catalog), awards);
    let recommendations = RecommendationService::new(
        fetcher,
        config.ranking_policy(),
        config.presentation_settings(),
    );

    let app = create_router(Arc::new(AppState::new(recommendations)));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
