use crate::domain::fulfillment::{Subscription, SubscriptionPlan};
use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_plan(&self, plan_id: &str) -> Result<Option<SubscriptionPlan>>;

    /// One live row per user; a later activation replaces the earlier one.
    async fn upsert_subscription(&self, subscription: &Subscription) -> Result<()>;

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Subscription>>;
}

#[derive(Clone)]
pub struct SubscriptionsRepo {
    pub pool: PgPool,
}

#[async_trait::async_trait]
impl SubscriptionStore for SubscriptionsRepo {
    async fn find_plan(&self, plan_id: &str) -> Result<Option<SubscriptionPlan>> {
        let row = sqlx::query(
            "SELECT plan_id, name, duration_days FROM subscription_plans WHERE plan_id = $1",
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SubscriptionPlan {
            plan_id: r.get("plan_id"),
            name: r.get("name"),
            duration_days: r.get("duration_days"),
        }))
    }

    async fn upsert_subscription(&self, s: &Subscription) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, plan_id, status, start_date, end_date, payment_ref, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (user_id) DO UPDATE SET
                plan_id = EXCLUDED.plan_id,
                status = EXCLUDED.status,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                payment_ref = EXCLUDED.payment_ref,
                updated_at = now()
            "#,
        )
        .bind(s.user_id)
        .bind(&s.plan_id)
        .bind(&s.status)
        .bind(s.start_date)
        .bind(s.end_date)
        .bind(&s.payment_ref)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Subscription>> {
        let row = sqlx::query(
            "SELECT user_id, plan_id, status, start_date, end_date, payment_ref FROM subscriptions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Subscription {
            user_id: r.get("user_id"),
            plan_id: r.get("plan_id"),
            status: r.get("status"),
            start_date: r.get("start_date"),
            end_date: r.get("end_date"),
            payment_ref: r.get("payment_ref"),
        }))
    }
}
