use crate::gateways::mock::MOCK_TOKEN_PREFIX;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Failed)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a payment buys, with only the linkage that kind of purchase needs.
///
/// Built from the stored `payment_type` column and the metadata bag. The
/// linkage ids are optional: a payment without them is still valid and is
/// simply marked paid without fulfillment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentKind {
    Subscription { plan_id: Option<String> },
    Booking { booking_id: Option<Uuid> },
    Other { payment_type: String },
}

impl PaymentKind {
    pub fn from_parts(payment_type: &str, metadata: &Map<String, Value>) -> Self {
        match payment_type.trim().to_lowercase().as_str() {
            "subscription" => PaymentKind::Subscription {
                plan_id: metadata
                    .get("plan_id")
                    .and_then(metadata_string)
                    .filter(|s| !s.is_empty()),
            },
            "booking" => PaymentKind::Booking {
                booking_id: metadata
                    .get("booking_id")
                    .and_then(metadata_string)
                    .and_then(|s| Uuid::parse_str(&s).ok()),
            },
            other => PaymentKind::Other {
                payment_type: other.to_string(),
            },
        }
    }

    pub fn payment_type(&self) -> &str {
        match self {
            PaymentKind::Subscription { .. } => "subscription",
            PaymentKind::Booking { .. } => "booking",
            PaymentKind::Other { payment_type } => payment_type,
        }
    }
}

fn metadata_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub ref_code: String,
    pub user_id: Uuid,
    pub amount: i64,
    pub kind: PaymentKind,
    pub status: PaymentStatus,
    pub metadata: Map<String, Value>,
    pub snap_token: Option<String>,
    pub qris_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Whether checkout went through the local mock instead of the gateway.
    pub fn is_mock_checkout(&self) -> bool {
        self.metadata.get("mock_payment").and_then(Value::as_bool) == Some(true)
            || self
                .snap_token
                .as_deref()
                .is_some_and(|t| t.starts_with(MOCK_TOKEN_PREFIX))
    }

    pub fn view(&self) -> PaymentView {
        PaymentView {
            id: self.id,
            ref_code: self.ref_code.clone(),
            user_id: self.user_id,
            amount: self.amount,
            payment_type: self.kind.payment_type().to_string(),
            status: self.status,
            metadata: self.metadata.clone(),
            snap_token: self.snap_token.clone(),
            qris_link: self.qris_link.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: Uuid,
    pub ref_code: String,
    pub user_id: Uuid,
    pub amount: i64,
    pub kind: PaymentKind,
    pub metadata: Map<String, Value>,
    pub snap_token: Option<String>,
    pub qris_link: Option<String>,
}

/// Read-only projection returned by status polling and history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentView {
    pub id: Uuid,
    pub ref_code: String,
    pub user_id: Uuid,
    pub amount: i64,
    pub payment_type: String,
    pub status: PaymentStatus,
    pub metadata: Map<String, Value>,
    pub snap_token: Option<String>,
    pub qris_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateChargeRequest {
    pub user_id: Option<String>,
    pub amount: Option<f64>,
    pub payment_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChargeResponse {
    pub snap_token: String,
    pub redirect_url: String,
    pub ref_code: String,
    pub payment_id: Uuid,
    pub mock_payment: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusQuery {
    pub ref_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub payment: PaymentView,
}
