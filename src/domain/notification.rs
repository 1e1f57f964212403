use crate::domain::ref_code::normalize_amount;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a gateway payment notification.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayNotification {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub gross_amount: Value,
    #[serde(default)]
    pub signature_key: String,
    #[serde(default)]
    pub transaction_status: String,
    pub fraud_status: Option<String>,
}

impl GatewayNotification {
    /// The amount exactly as the gateway sent it, which is what it signed.
    pub fn gross_amount_text(&self) -> String {
        match &self.gross_amount {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Gross amount as an integral value comparable with `Payment::amount`.
    pub fn gross_amount_minor(&self) -> Option<i64> {
        self.gross_amount_text()
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(normalize_amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionQuery {
    pub ref_code: Option<String>,
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub payment_type: Option<String>,
}
