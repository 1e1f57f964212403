use crate::domain::fulfillment::BookingParties;
use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait BookingStore: Send + Sync {
    /// Marks the booking paid and returns who it is between, or `None` if
    /// no such booking exists.
    async fn mark_paid(&self, booking_id: Uuid, payment_ref: &str) -> Result<Option<BookingParties>>;
}

#[derive(Clone)]
pub struct BookingsRepo {
    pub pool: PgPool,
}

#[async_trait::async_trait]
impl BookingStore for BookingsRepo {
    async fn mark_paid(&self, booking_id: Uuid, payment_ref: &str) -> Result<Option<BookingParties>> {
        let row = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'paid', payment_ref = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, professional_id
            "#,
        )
        .bind(booking_id)
        .bind(payment_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| BookingParties {
            booking_id: r.get("id"),
            user_id: r.get("user_id"),
            professional_id: r.get("professional_id"),
        }))
    }
}
