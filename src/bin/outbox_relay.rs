use anyhow::Result;
use ruang_payments::config::AppConfig;
use ruang_payments::repo::outbox_repo::OutboxRepo;
use ruang_payments::service::outbox_relay::OutboxRelay;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&cfg.database_url)
        .await?;

    let relay = OutboxRelay {
        outbox: Arc::new(OutboxRepo { pool }),
        redis_client: redis::Client::open(cfg.redis_url.clone())?,
        stream_key: cfg.events_stream_key.clone(),
        poll_interval: std::time::Duration::from_millis(500),
    };

    tracing::info!(stream = %cfg.events_stream_key, "outbox relay started");
    relay.run().await;
    Ok(())
}
