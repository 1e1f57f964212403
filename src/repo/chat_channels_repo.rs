use crate::domain::fulfillment::{BookingParties, ChatChannel};
use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait ChatChannelStore: Send + Sync {
    /// Keyed on the (user, professional) pair.
    async fn upsert_channel(&self, parties: &BookingParties) -> Result<ChatChannel>;
}

#[derive(Clone)]
pub struct ChatChannelsRepo {
    pub pool: PgPool,
}

#[async_trait::async_trait]
impl ChatChannelStore for ChatChannelsRepo {
    async fn upsert_channel(&self, parties: &BookingParties) -> Result<ChatChannel> {
        let row = sqlx::query(
            r#"
            INSERT INTO chat_channels (id, user_id, professional_id, booking_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, professional_id) DO UPDATE SET
                booking_id = EXCLUDED.booking_id,
                updated_at = now()
            RETURNING id, user_id, professional_id, booking_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(parties.user_id)
        .bind(parties.professional_id)
        .bind(parties.booking_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ChatChannel {
            id: row.get("id"),
            user_id: row.get("user_id"),
            professional_id: row.get("professional_id"),
            booking_id: row.get("booking_id"),
            created_at: row.get("created_at"),
        })
    }
}
