use crate::domain::payment::{Payment, PaymentStatus};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentEventType {
    #[serde(rename = "payment.paid")]
    Paid,
    #[serde(rename = "payment.failed")]
    Failed,
    #[serde(rename = "payment.fulfillment_failed")]
    FulfillmentFailed,
}

impl PaymentEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentEventType::Paid => "payment.paid",
            PaymentEventType::Failed => "payment.failed",
            PaymentEventType::FulfillmentFailed => "payment.fulfillment_failed",
        }
    }

    /// Event written in the same store operation as a status transition.
    pub fn for_transition(status: PaymentStatus) -> Option<Self> {
        match status {
            PaymentStatus::Paid => Some(PaymentEventType::Paid),
            PaymentStatus::Failed => Some(PaymentEventType::Failed),
            PaymentStatus::Pending => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    Webhook,
    MockRedirect,
    Manual,
}

impl CompletionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionSource::Webhook => "webhook",
            CompletionSource::MockRedirect => "mock_redirect",
            CompletionSource::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLifecycleEvent {
    pub event_type: PaymentEventType,
    pub payment_id: Uuid,
    pub ref_code: String,
    pub user_id: Uuid,
    pub payment_type: String,
    pub amount: i64,
    pub source: String,
    pub detail: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl PaymentLifecycleEvent {
    pub fn for_payment(
        event_type: PaymentEventType,
        payment: &Payment,
        source: &str,
        detail: Option<String>,
    ) -> Self {
        Self {
            event_type,
            payment_id: payment.id,
            ref_code: payment.ref_code.clone(),
            user_id: payment.user_id,
            payment_type: payment.kind.payment_type().to_string(),
            amount: payment.amount,
            source: source.to_string(),
            detail,
            occurred_at: Utc::now(),
        }
    }
}

/// Where fulfillment failures are reported. Transition events are written by
/// `PaymentStore::update_status_if_pending` itself.
#[async_trait::async_trait]
pub trait PaymentEventSink: Send + Sync {
    async fn publish(&self, event: PaymentLifecycleEvent) -> Result<()>;
}
