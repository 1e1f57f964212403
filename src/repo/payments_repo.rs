use crate::domain::payment::{NewPayment, Payment, PaymentKind, PaymentStatus};
use crate::repo::outbox_repo::OutboxRepo;
use crate::service::events::PaymentLifecycleEvent;
use anyhow::{Context, Result};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait PaymentStore: Send + Sync {
    /// Fails on a duplicate `ref_code`; never overwrites.
    async fn insert(&self, payment: &NewPayment) -> Result<Payment>;

    async fn find_by_ref_code(&self, ref_code: &str) -> Result<Option<Payment>>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>>;

    /// Conditional update: moves the payment to `status` only while it is
    /// still `pending`, recording `event` atomically with the change. Returns
    /// the updated row, or `None` if another caller already finalized it (or
    /// it does not exist); in that case no event is recorded.
    async fn update_status_if_pending(
        &self,
        ref_code: &str,
        status: PaymentStatus,
        event: Option<&PaymentLifecycleEvent>,
    ) -> Result<Option<Payment>>;
}

#[derive(Clone)]
pub struct PaymentsRepo {
    pub pool: PgPool,
}

const PAYMENT_COLUMNS: &str = "id, ref_code, user_id, amount, payment_type, status, metadata, snap_token, qris_link, created_at, updated_at";

fn payment_from_row(r: &PgRow) -> Result<Payment> {
    let status: String = r.get("status");
    let payment_type: String = r.get("payment_type");
    let metadata: serde_json::Value = r.get("metadata");
    let metadata = metadata.as_object().cloned().unwrap_or_default();

    Ok(Payment {
        id: r.get("id"),
        ref_code: r.get("ref_code"),
        user_id: r.get("user_id"),
        amount: r.get("amount"),
        kind: PaymentKind::from_parts(&payment_type, &metadata),
        status: PaymentStatus::parse(&status)
            .with_context(|| format!("unknown payment status {:?}", status))?,
        metadata,
        snap_token: r.get("snap_token"),
        qris_link: r.get("qris_link"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

#[async_trait::async_trait]
impl PaymentStore for PaymentsRepo {
    async fn insert(&self, payment: &NewPayment) -> Result<Payment> {
        let sql = format!(
            r#"
            INSERT INTO payments (id, ref_code, user_id, amount, payment_type, status, metadata, snap_token, qris_link)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(payment.id)
            .bind(&payment.ref_code)
            .bind(payment.user_id)
            .bind(payment.amount)
            .bind(payment.kind.payment_type())
            .bind(serde_json::Value::Object(payment.metadata.clone()))
            .bind(&payment.snap_token)
            .bind(&payment.qris_link)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("insert payment {}", payment.ref_code))?;

        payment_from_row(&row)
    }

    async fn find_by_ref_code(&self, ref_code: &str) -> Result<Option<Payment>> {
        let sql = format!("SELECT {} FROM payments WHERE ref_code = $1", PAYMENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(ref_code)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(payment_from_row).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>> {
        let sql = format!(
            "SELECT {} FROM payments WHERE user_id = $1 ORDER BY created_at DESC",
            PAYMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(payment_from_row).collect()
    }

    async fn update_status_if_pending(
        &self,
        ref_code: &str,
        status: PaymentStatus,
        event: Option<&PaymentLifecycleEvent>,
    ) -> Result<Option<Payment>> {
        let sql = format!(
            r#"
            UPDATE payments
            SET status = $2, updated_at = now()
            WHERE ref_code = $1 AND status = 'pending'
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&sql)
            .bind(ref_code)
            .bind(status.as_str())
            .fetch_optional(tx.as_mut())
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        if let Some(event) = event {
            OutboxRepo::insert_tx(&mut tx, event).await?;
        }
        tx.commit().await?;

        payment_from_row(&row).map(Some)
    }
}
