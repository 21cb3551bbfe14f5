//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache and stream setup, and the Axum server
//! lifecycle. Click events are only published here; they are persisted by
//! the separate `click-worker` process.

use crate::application::services::{AnalyticsService, LinkService};
use crate::config::Config;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use crate::infrastructure::stream::RedisStream;
use crate::routes::app_router;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use crate::utils::alias::AliasGenerator;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Opens the PostgreSQL pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or NullCache fallback)
/// - Redis stream publisher for click events
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The click stream cannot be reached
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    let cache: Arc<dyn CacheService> = match RedisCache::connect(&config.redis_url).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis cache: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    };

    let stream = Arc::new(
        RedisStream::connect(&config.redis_url)
            .await
            .context("Failed to connect to the click stream")?,
    );

    let pool = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
    let click_repository = Arc::new(PgClickRepository::new(pool));

    let link_service = Arc::new(LinkService::new(
        link_repository.clone(),
        cache.clone(),
        stream.clone(),
        config.click_stream.clone(),
        config.cache_ttl(),
        AliasGenerator::from_entropy(),
    ));
    let analytics_service = Arc::new(AnalyticsService::new(click_repository));

    let state = AppState::new(
        link_service,
        analytics_service,
        link_repository,
        cache,
        stream,
        config.behind_proxy,
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
