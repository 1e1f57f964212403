use crate::error::PaymentError;
use crate::gateways::{CheckoutGateway, CheckoutRequest, CheckoutSession};

pub const MOCK_TOKEN_PREFIX: &str = "MOCK-";

pub fn mock_session(app_base_url: &str, request: &CheckoutRequest) -> CheckoutSession {
    let endpoint = format!(
        "{}/api/payments/mock-complete",
        app_base_url.trim_end_matches('/')
    );
    let user_id = request.user_id.to_string();
    let redirect_url = reqwest::Url::parse_with_params(
        &endpoint,
        &[
            ("ref_code", request.ref_code.as_str()),
            ("user_id", user_id.as_str()),
            ("type", request.payment_type.as_str()),
        ],
    )
    .map(|u| u.to_string())
    .unwrap_or_else(|_| format!("{}?ref_code={}", endpoint, request.ref_code));

    CheckoutSession {
        token: format!("{}{}", MOCK_TOKEN_PREFIX, request.ref_code),
        redirect_url,
        is_mock: true,
    }
}

/// Gateway used when no live gateway is configured; every checkout is a mock.
pub struct MockCheckoutGateway {
    pub app_base_url: String,
}

#[async_trait::async_trait]
impl CheckoutGateway for MockCheckoutGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        Ok(mock_session(&self.app_base_url, request))
    }
}
