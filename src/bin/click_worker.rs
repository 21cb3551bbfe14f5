//! Click ingestion worker.
//!
//! Consumes click events from the click stream as one consumer of the
//! consumer group and persists them as click records. Run several processes
//! with distinct `WORKER_CONSUMER` names to scale out.
//!
//! # Usage
//!
//! ```bash
//! WORKER_CONSUMER=consumer-2 cargo run --bin click-worker
//! ```
//!
//! Stops on SIGINT/SIGTERM after finishing the batch in hand.

use anyhow::{Context, Result};
use std::sync::Arc;

use shorty::domain::click_worker::ClickWorker;
use shorty::infrastructure::persistence::PgClickRepository;
use shorty::infrastructure::stream::RedisStream;
use shorty::shutdown::shutdown_channel;
use shorty::{config, server, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;

    telemetry::init_tracing(&config.log_level, &config.log_format);
    config.print_summary();

    let pool = server::connect_pool(&config).await?;

    let stream = RedisStream::connect_for_consumer(&config.redis_url)
        .await
        .context("Failed to connect to the click stream")?;

    let worker = ClickWorker::new(
        Arc::new(stream),
        Arc::new(PgClickRepository::new(Arc::new(pool))),
        config.worker_settings(),
    );

    worker
        .run(shutdown_channel())
        .await
        .context("Click worker failed to start")?;

    Ok(())
}
