use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionPlan {
    pub plan_id: String,
    pub name: String,
    pub duration_days: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: Uuid,
    pub plan_id: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_ref: String,
}

impl Subscription {
    pub fn activate(
        user_id: Uuid,
        plan: &SubscriptionPlan,
        payment_ref: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            plan_id: plan.plan_id.clone(),
            status: "active".to_string(),
            start_date: now,
            end_date: now + chrono::Duration::days(plan.duration_days as i64),
            payment_ref: payment_ref.to_string(),
        }
    }
}

/// The two sides of a paid booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingParties {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub professional_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChannel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub professional_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
}
