use crate::domain::payment::{Payment, PaymentStatus};
use crate::error::PaymentError;
use crate::reconcile::state::{map_gateway_status, TransactionOutcome};
use crate::reconcile::transitions::transition;
use crate::repo::payments_repo::PaymentStore;
use crate::service::events::{CompletionSource, PaymentEventType, PaymentLifecycleEvent};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub payment: Payment,
    /// Status this call moved the payment into, if it moved it at all.
    pub transitioned: Option<PaymentStatus>,
}

impl ReconcileOutcome {
    pub fn freshly_paid(&self) -> bool {
        self.transitioned == Some(PaymentStatus::Paid)
    }
}

#[derive(Clone)]
pub struct Reconciler {
    pub payments: Arc<dyn PaymentStore>,
}

impl Reconciler {
    pub fn new(payments: Arc<dyn PaymentStore>) -> Self {
        Self { payments }
    }

    pub async fn reconcile_gateway_status(
        &self,
        ref_code: &str,
        transaction_status: &str,
        fraud_status: Option<&str>,
        source: CompletionSource,
    ) -> Result<ReconcileOutcome, PaymentError> {
        self.reconcile(
            ref_code,
            map_gateway_status(transaction_status, fraud_status),
            source,
        )
        .await
    }

    pub async fn reconcile(
        &self,
        ref_code: &str,
        outcome: TransactionOutcome,
        source: CompletionSource,
    ) -> Result<ReconcileOutcome, PaymentError> {
        let current = self
            .payments
            .find_by_ref_code(ref_code)
            .await?
            .ok_or(PaymentError::PaymentNotFound)?;

        let Some(next) = transition(current.status, outcome) else {
            tracing::debug!(
                ref_code = %ref_code,
                status = %current.status,
                ?outcome,
                "reconcile is a no-op"
            );
            return Ok(ReconcileOutcome {
                payment: current,
                transitioned: None,
            });
        };

        let event = PaymentEventType::for_transition(next)
            .map(|t| PaymentLifecycleEvent::for_payment(t, &current, source.as_str(), None));

        match self
            .payments
            .update_status_if_pending(ref_code, next, event.as_ref())
            .await?
        {
            Some(updated) => {
                tracing::info!(
                    ref_code = %ref_code,
                    from = %current.status,
                    to = %updated.status,
                    source = source.as_str(),
                    "payment status changed"
                );
                Ok(ReconcileOutcome {
                    payment: updated,
                    transitioned: Some(next),
                })
            }
            None => {
                // Lost the race to a concurrent finalizer.
                let latest = self
                    .payments
                    .find_by_ref_code(ref_code)
                    .await?
                    .ok_or(PaymentError::PaymentNotFound)?;
                Ok(ReconcileOutcome {
                    payment: latest,
                    transitioned: None,
                })
            }
        }
    }
}
