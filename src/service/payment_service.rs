use crate::domain::fulfillment::UserProfile;
use crate::domain::notification::{GatewayNotification, WebhookAck};
use crate::domain::payment::{
    CreateChargeRequest, CreateChargeResponse, NewPayment, PaymentKind, PaymentStatus, PaymentView,
};
use crate::domain::ref_code::{generate_ref_code, normalize_amount};
use crate::error::PaymentError;
use crate::gateways::signature::verify_signature;
use crate::gateways::{CheckoutGateway, CheckoutRequest, CustomerDetails};
use crate::reconcile::state::TransactionOutcome;
use crate::repo::payments_repo::PaymentStore;
use crate::repo::users_repo::UserDirectory;
pub use crate::service::events::CompletionSource;
use crate::service::events::{PaymentEventSink, PaymentEventType, PaymentLifecycleEvent};
use crate::service::fulfillment::{FulfillmentDispatcher, FulfillmentOutcome};
use crate::service::reconciler::{ReconcileOutcome, Reconciler};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Optional consistency checks for completion requests that carry the
/// payer and type alongside the reference code.
#[derive(Debug, Clone, Default)]
pub struct CompletionGuard {
    pub user_id: Option<Uuid>,
    pub payment_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionResult {
    pub payment: PaymentView,
    pub newly_paid: bool,
    pub fulfillment_error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FinalizeReport {
    pub fulfillment: Option<FulfillmentOutcome>,
    pub fulfillment_error: Option<String>,
}

#[derive(Clone)]
pub struct PaymentService {
    pub payments: Arc<dyn PaymentStore>,
    pub users: Arc<dyn UserDirectory>,
    pub gateway: Arc<dyn CheckoutGateway>,
    pub reconciler: Reconciler,
    pub fulfillment: FulfillmentDispatcher,
    pub events: Arc<dyn PaymentEventSink>,
    pub server_key: Option<String>,
}

impl PaymentService {
    pub async fn create_charge(
        &self,
        req: CreateChargeRequest,
    ) -> Result<CreateChargeResponse, PaymentError> {
        let (user_id, amount, payment_type) = validate_request(&req)?;

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(PaymentError::UserNotFound)?;

        let mut metadata = req.metadata.unwrap_or_default();
        let kind = PaymentKind::from_parts(&payment_type, &metadata);
        let ref_code = generate_ref_code(kind.payment_type());

        let checkout = CheckoutRequest {
            ref_code: ref_code.clone(),
            amount,
            customer: customer_details(&user),
            user_id,
            payment_type: kind.payment_type().to_string(),
        };
        let session = self.gateway.create_checkout(&checkout).await?;

        metadata.insert("redirect_url".to_string(), Value::String(session.redirect_url.clone()));
        metadata.insert("mock_payment".to_string(), Value::Bool(session.is_mock));

        let payment = self
            .payments
            .insert(&NewPayment {
                id: Uuid::new_v4(),
                ref_code: ref_code.clone(),
                user_id,
                amount,
                kind,
                metadata,
                snap_token: Some(session.token.clone()),
                qris_link: None,
            })
            .await?;

        tracing::info!(
            ref_code = %payment.ref_code,
            payment_id = %payment.id,
            amount = payment.amount,
            gateway = self.gateway.name(),
            mock = session.is_mock,
            "payment created"
        );

        Ok(CreateChargeResponse {
            snap_token: session.token,
            redirect_url: session.redirect_url,
            ref_code: payment.ref_code,
            payment_id: payment.id,
            mock_payment: session.is_mock,
        })
    }

    pub async fn handle_notification(
        &self,
        notification: GatewayNotification,
    ) -> Result<WebhookAck, PaymentError> {
        let server_key = self
            .server_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PaymentError::Configuration("MIDTRANS_SERVER_KEY is not set".to_string()))?;

        if !verify_signature(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount_text(),
            &notification.signature_key,
            server_key,
        ) {
            tracing::warn!(
                order_id = %notification.order_id,
                transaction_status = %notification.transaction_status,
                "webhook signature mismatch"
            );
            return Err(PaymentError::InvalidSignature);
        }

        let stored = self
            .payments
            .find_by_ref_code(&notification.order_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound)?;
        if notification.gross_amount_minor() != Some(stored.amount) {
            tracing::error!(
                ref_code = %stored.ref_code,
                stored_amount = stored.amount,
                gross_amount = %notification.gross_amount_text(),
                transaction_status = %notification.transaction_status,
                "notification amount does not match payment"
            );
            return Err(PaymentError::Validation(
                "gross_amount does not match payment amount".to_string(),
            ));
        }

        let outcome = self
            .reconciler
            .reconcile_gateway_status(
                &notification.order_id,
                &notification.transaction_status,
                notification.fraud_status.as_deref(),
                CompletionSource::Webhook,
            )
            .await?;

        let report = self.finalize(&outcome, CompletionSource::Webhook).await?;

        let message = match (outcome.transitioned, report.fulfillment_error) {
            (Some(PaymentStatus::Paid), Some(_)) => {
                "payment marked paid; fulfillment pending follow-up".to_string()
            }
            (Some(status), _) => format!("payment marked {}", status),
            (None, _) => format!("payment is {}", outcome.payment.status),
        };

        Ok(WebhookAck {
            success: true,
            message,
        })
    }

    /// Completion without a gateway signature (mock redirect or manual test).
    /// Treated as a settled transaction; terminal payments are left alone.
    /// The mock redirect only completes payments whose checkout was a mock.
    pub async fn complete_without_gateway(
        &self,
        ref_code: &str,
        guard: CompletionGuard,
        source: CompletionSource,
    ) -> Result<CompletionResult, PaymentError> {
        if ref_code.trim().is_empty() {
            return Err(PaymentError::Validation("ref_code is required".to_string()));
        }

        let existing = self
            .payments
            .find_by_ref_code(ref_code)
            .await?
            .ok_or(PaymentError::PaymentNotFound)?;

        if source == CompletionSource::MockRedirect && !existing.is_mock_checkout() {
            tracing::warn!(
                ref_code = %existing.ref_code,
                "mock completion attempted on a live gateway checkout"
            );
            return Err(PaymentError::Validation(
                "payment was not created through the mock checkout".to_string(),
            ));
        }

        if let Some(user_id) = guard.user_id {
            if user_id != existing.user_id {
                return Err(PaymentError::Validation(
                    "user_id does not match payment".to_string(),
                ));
            }
        }
        if let Some(payment_type) = guard.payment_type.as_deref() {
            if !payment_type.eq_ignore_ascii_case(existing.kind.payment_type()) {
                return Err(PaymentError::Validation(
                    "type does not match payment".to_string(),
                ));
            }
        }

        let outcome = self
            .reconciler
            .reconcile(ref_code, TransactionOutcome::Settled, source)
            .await?;
        let report = self.finalize(&outcome, source).await?;

        Ok(CompletionResult {
            payment: outcome.payment.view(),
            newly_paid: outcome.freshly_paid(),
            fulfillment_error: report.fulfillment_error,
        })
    }

    pub async fn get_status(&self, ref_code: &str) -> Result<PaymentView, PaymentError> {
        if ref_code.trim().is_empty() {
            return Err(PaymentError::Validation("ref_code is required".to_string()));
        }
        self.payments
            .find_by_ref_code(ref_code)
            .await?
            .map(|p| p.view())
            .ok_or(PaymentError::PaymentNotFound)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PaymentView>, PaymentError> {
        let payments = self.payments.list_by_user(user_id).await?;
        Ok(payments.iter().map(|p| p.view()).collect())
    }

    /// Runs fulfillment after a fresh `paid` transition. The status and its
    /// event are already committed; a fulfillment error is reported, not
    /// returned, unless the failure itself cannot be recorded.
    async fn finalize(
        &self,
        outcome: &ReconcileOutcome,
        source: CompletionSource,
    ) -> Result<FinalizeReport, PaymentError> {
        let mut report = FinalizeReport::default();
        if !outcome.freshly_paid() {
            return Ok(report);
        }

        let payment = &outcome.payment;
        match self.fulfillment.fulfill(payment).await {
            Ok(done) => {
                tracing::info!(ref_code = %payment.ref_code, outcome = ?done, "payment fulfilled");
                report.fulfillment = Some(done);
            }
            Err(e) => {
                tracing::error!(
                    ref_code = %payment.ref_code,
                    payment_id = %payment.id,
                    error = %e,
                    "fulfillment failed after payment was marked paid"
                );
                let event = PaymentLifecycleEvent::for_payment(
                    PaymentEventType::FulfillmentFailed,
                    payment,
                    source.as_str(),
                    Some(e.to_string()),
                );
                if let Err(publish_err) = self.events.publish(event).await {
                    tracing::error!(
                        ref_code = %payment.ref_code,
                        fulfillment_error = %e,
                        error = %publish_err,
                        "fulfillment failure could not be recorded"
                    );
                    return Err(PaymentError::Store(publish_err.context(format!(
                        "record fulfillment failure for {}",
                        payment.ref_code
                    ))));
                }
                report.fulfillment_error = Some(e.to_string());
            }
        }

        Ok(report)
    }
}

fn validate_request(req: &CreateChargeRequest) -> Result<(Uuid, i64, String), PaymentError> {
    let user_id = req
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PaymentError::Validation("user_id is required".to_string()))?;
    let user_id = Uuid::parse_str(user_id)
        .map_err(|_| PaymentError::Validation("user_id must be a UUID".to_string()))?;

    let amount = req
        .amount
        .ok_or_else(|| PaymentError::Validation("amount is required".to_string()))?;
    let amount = normalize_amount(amount)
        .ok_or_else(|| PaymentError::Validation("amount must be a positive number".to_string()))?;

    let payment_type = req
        .payment_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PaymentError::Validation("payment_type is required".to_string()))?;

    Ok((user_id, amount, payment_type.to_string()))
}

fn customer_details(user: &UserProfile) -> CustomerDetails {
    let first_name = user
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| {
            user.email
                .as_deref()
                .and_then(|e| e.split('@').next())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Customer".to_string());

    CustomerDetails {
        first_name,
        email: user.email.clone(),
    }
}
