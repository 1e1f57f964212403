use crate::error::PaymentError;
use crate::gateways::mock::mock_session;
use crate::gateways::{CheckoutGateway, CheckoutRequest, CheckoutSession};
use serde_json::json;

pub const SANDBOX_KEY_PREFIX: &str = "SB-Mid-server-";
pub const PRODUCTION_KEY_PREFIX: &str = "Mid-server-";

/// Snap hosted-checkout adapter.
pub struct MidtransGateway {
    pub base_url: String,
    pub server_key: Option<String>,
    pub app_base_url: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

pub fn validate_server_key(key: Option<&str>) -> Result<&str, PaymentError> {
    let key = key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| PaymentError::Configuration("MIDTRANS_SERVER_KEY is not set".to_string()))?;

    if key.starts_with(SANDBOX_KEY_PREFIX) || key.starts_with(PRODUCTION_KEY_PREFIX) {
        Ok(key)
    } else {
        Err(PaymentError::Configuration(
            "MIDTRANS_SERVER_KEY does not look like a sandbox or production server key".to_string(),
        ))
    }
}

impl MidtransGateway {
    fn callback_url(&self, page: &str, ref_code: &str) -> String {
        format!(
            "{}/payment/{}?ref_code={}",
            self.app_base_url.trim_end_matches('/'),
            page,
            ref_code
        )
    }

    fn fallback(&self, request: &CheckoutRequest, reason: &str) -> CheckoutSession {
        tracing::warn!(
            ref_code = %request.ref_code,
            reason = %reason,
            "snap checkout unavailable, falling back to mock checkout"
        );
        mock_session(&self.app_base_url, request)
    }
}

#[async_trait::async_trait]
impl CheckoutGateway for MidtransGateway {
    fn name(&self) -> &'static str {
        "midtrans"
    }

    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        let server_key = validate_server_key(self.server_key.as_deref())?;

        let url = format!("{}/snap/v1/transactions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "transaction_details": {
                "order_id": request.ref_code,
                "gross_amount": request.amount
            },
            "customer_details": {
                "first_name": request.customer.first_name,
                "email": request.customer.email
            },
            "callbacks": {
                "finish": self.callback_url("finish", &request.ref_code),
                "error": self.callback_url("error", &request.ref_code),
                "pending": self.callback_url("pending", &request.ref_code)
            }
        });

        let resp = self
            .client
            .post(url)
            .basic_auth(server_key, Some(""))
            .header("Accept", "application/json")
            .json(&body)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        let session = match resp {
            Ok(r) if r.status().is_success() => {
                let v: serde_json::Value = r.json().await.unwrap_or_default();
                let token = v.get("token").and_then(|t| t.as_str());
                let redirect_url = v.get("redirect_url").and_then(|u| u.as_str());
                match (token, redirect_url) {
                    (Some(token), Some(redirect_url)) => CheckoutSession {
                        token: token.to_string(),
                        redirect_url: redirect_url.to_string(),
                        is_mock: false,
                    },
                    _ => self.fallback(request, "response missing token or redirect_url"),
                }
            }
            Ok(r) => {
                let status = r.status();
                let body = r.text().await.unwrap_or_default();
                let reason = format!(
                    "HTTP_{}: {}",
                    status.as_u16(),
                    body.chars().take(200).collect::<String>()
                );
                self.fallback(request, &reason)
            }
            Err(e) if e.is_timeout() => self.fallback(request, "gateway timeout"),
            Err(e) => self.fallback(request, &format!("network error: {}", e)),
        };

        Ok(session)
    }
}
