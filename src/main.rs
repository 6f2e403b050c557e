// src/main.rs
use events_api::{
    api::ApiServer,
    cache::{CacheStore, MemoryCache, RedisCache},
    config::{load_config, CacheBackend},
    events::{EventService, ServiceOptions},
    provider::ProviderClient,
    utils::setup_logging,
};
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- Configuration & Initialization ---
    let app_config = load_config()?;
    setup_logging(app_config.log_level_filter())?;
    info!("Events API starting...");
    app_config.log_settings();

    let cache: Arc<dyn CacheStore> = match app_config.cache.backend {
        CacheBackend::Redis => Arc::new(RedisCache::new(&app_config.cache)?),
        CacheBackend::Memory => {
            info!("Using in-process cache; entries are not shared across instances");
            Arc::new(MemoryCache::new())
        }
    };
    let feed = Arc::new(ProviderClient::new(&app_config.provider)?);
    info!("Provider feed: {}", feed.url());

    let service = Arc::new(EventService::new(
        feed,
        cache,
        ServiceOptions::from(&app_config.cache),
    ));

    ApiServer::new(app_config.server.clone(), service).start().await?;
    Ok(())
}
