//! contentdeck - a regionalized content publishing service

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contentdeck::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contentdeck=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting contentdeck...");

    // Load configuration (file first, env overrides on top)
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    // Build application state
    let state = AppState::build(pool.clone(), cache);

    // Expiry sweep: archive published items whose expire_at has passed
    {
        let item_service = state.item_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                match item_service.expire_due(chrono::Utc::now()).await {
                    Ok(0) => {}
                    Ok(count) => tracing::info!(count, "Expired content items archived"),
                    Err(e) => tracing::warn!(error = %e, "Expiry sweep failed"),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
