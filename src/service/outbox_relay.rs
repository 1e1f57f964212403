use crate::repo::outbox_repo::{OutboxEvent, OutboxQueue};
use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;

pub const BATCH_SIZE: i64 = 100;

/// Drains the payment events outbox into a Redis stream.
#[derive(Clone)]
pub struct OutboxRelay {
    pub outbox: Arc<dyn OutboxQueue>,
    pub redis_client: redis::Client,
    pub stream_key: String,
    pub poll_interval: std::time::Duration,
}

pub fn retry_backoff_seconds(attempts: i32) -> i64 {
    i64::min(300, 2_i64.pow(attempts.clamp(0, 8) as u32))
}

impl OutboxRelay {
    pub async fn run(self) {
        loop {
            match self.tick().await {
                Ok(0) => {}
                Ok(published) => tracing::debug!(published, "outbox batch relayed"),
                Err(err) => tracing::error!(error = %err, "outbox relay error"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One claim-and-publish pass. Returns how many events reached the stream.
    ///
    /// The Redis connection is opened before anything is claimed, so an
    /// unreachable Redis leaves the outbox untouched.
    pub async fn tick(&self) -> Result<usize> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        let batch = self.outbox.claim_batch(BATCH_SIZE).await?;
        let mut published = 0;
        for item in batch {
            match self.xadd(&mut conn, &item).await {
                Ok(()) => {
                    self.outbox.mark_published(item.id).await?;
                    published += 1;
                }
                Err(e) => {
                    let attempts = item.attempts + 1;
                    let next_attempt_at = Utc::now() + Duration::seconds(retry_backoff_seconds(attempts));
                    self.outbox.mark_retry(item.id, attempts, next_attempt_at).await?;
                    tracing::warn!(
                        outbox_id = item.id,
                        ref_code = %item.ref_code,
                        attempts,
                        error = %e,
                        "xadd failed, event rescheduled"
                    );
                }
            }
        }

        Ok(published)
    }

    async fn xadd(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        item: &OutboxEvent,
    ) -> redis::RedisResult<()> {
        let payload = serde_json::to_string(&item.payload_json).unwrap_or_default();
        let _: String = redis::cmd("XADD")
            .arg(&self.stream_key)
            .arg("MAXLEN")
            .arg("~")
            .arg(100_000)
            .arg("*")
            .arg("event_type")
            .arg(&item.event_type)
            .arg("ref_code")
            .arg(&item.ref_code)
            .arg("event")
            .arg(payload)
            .query_async(conn)
            .await?;
        Ok(())
    }
}
