use crate::service::events::{PaymentEventSink, PaymentLifecycleEvent};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Row, Transaction};

/// Rows left in `PROCESSING` this long are assumed abandoned by a relay that
/// died mid-batch and are handed out again.
pub const STALE_PROCESSING_SECS: f64 = 300.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: i64,
    pub ref_code: String,
    pub event_type: String,
    pub payload_json: serde_json::Value,
    pub attempts: i32,
}

/// Claim/ack interface the relay drains.
#[async_trait::async_trait]
pub trait OutboxQueue: Send + Sync {
    /// Claims up to `batch_size` due rows, including stale claims.
    async fn claim_batch(&self, batch_size: i64) -> Result<Vec<OutboxEvent>>;

    async fn mark_published(&self, id: i64) -> Result<()>;

    async fn mark_retry(&self, id: i64, attempts: i32, next_attempt_at: DateTime<Utc>) -> Result<()>;
}

#[derive(Clone)]
pub struct OutboxRepo {
    pub pool: PgPool,
}

const INSERT_EVENT: &str = r#"
    INSERT INTO payment_events_outbox (ref_code, event_type, payload_json, status, attempts, next_attempt_at)
    VALUES ($1, $2, $3, 'PENDING', 0, now())
    ON CONFLICT (ref_code, event_type) DO NOTHING
"#;

impl OutboxRepo {
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        event: &PaymentLifecycleEvent,
    ) -> Result<()> {
        sqlx::query(INSERT_EVENT)
            .bind(&event.ref_code)
            .bind(event.event_type.as_str())
            .bind(serde_json::to_value(event)?)
            .execute(tx.as_mut())
            .await?;
        Ok(())
    }

    pub async fn insert(&self, event: &PaymentLifecycleEvent) -> Result<()> {
        sqlx::query(INSERT_EVENT)
            .bind(&event.ref_code)
            .bind(event.event_type.as_str())
            .bind(serde_json::to_value(event)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl OutboxQueue for OutboxRepo {
    async fn claim_batch(&self, batch_size: i64) -> Result<Vec<OutboxEvent>> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(
            r#"
            SELECT id, ref_code, event_type, payload_json, attempts
            FROM payment_events_outbox
            WHERE (status = 'PENDING' AND next_attempt_at <= now())
               OR (status = 'PROCESSING' AND updated_at < now() - make_interval(secs => $2))
            ORDER BY id ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(batch_size)
        .bind(STALE_PROCESSING_SECS)
        .fetch_all(tx.as_mut())
        .await?;

        if rows.is_empty() {
            tx.rollback().await?;
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.get("id")).collect();
        sqlx::query(
            "UPDATE payment_events_outbox SET status = 'PROCESSING', updated_at = now() WHERE id = ANY($1)",
        )
        .bind(&ids)
        .execute(tx.as_mut())
        .await?;
        tx.commit().await?;

        Ok(rows
            .into_iter()
            .map(|r| OutboxEvent {
                id: r.get("id"),
                ref_code: r.get("ref_code"),
                event_type: r.get("event_type"),
                payload_json: r.get("payload_json"),
                attempts: r.get("attempts"),
            })
            .collect())
    }

    async fn mark_published(&self, id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE payment_events_outbox SET status = 'PUBLISHED', published_at = now(), updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_retry(&self, id: i64, attempts: i32, next_attempt_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE payment_events_outbox SET status = 'PENDING', attempts = $2, next_attempt_at = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(attempts)
        .bind(next_attempt_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PaymentEventSink for OutboxRepo {
    async fn publish(&self, event: PaymentLifecycleEvent) -> Result<()> {
        self.insert(&event).await
    }
}
