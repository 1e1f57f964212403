use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod midtrans;
pub mod mock;
pub mod signature;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub ref_code: String,
    pub amount: i64,
    pub customer: CustomerDetails,
    pub user_id: Uuid,
    pub payment_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub token: String,
    pub redirect_url: String,
    pub is_mock: bool,
}

/// Hosted-checkout capability of an external payment gateway.
///
/// Implementations only fail for configuration problems. Upstream failures
/// degrade to a mock session so the checkout flow is never blocked.
#[async_trait::async_trait]
pub trait CheckoutGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError>;
}
