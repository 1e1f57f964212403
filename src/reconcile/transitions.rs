use crate::domain::payment::PaymentStatus;
use crate::reconcile::state::TransactionOutcome;

/// Next status for `current` given `outcome`, or `None` when nothing changes.
/// Terminal statuses never move.
pub fn transition(current: PaymentStatus, outcome: TransactionOutcome) -> Option<PaymentStatus> {
    match (current, outcome) {
        (PaymentStatus::Paid | PaymentStatus::Failed, _) => None,
        (PaymentStatus::Pending, TransactionOutcome::Settled) => Some(PaymentStatus::Paid),
        (PaymentStatus::Pending, TransactionOutcome::Failed) => Some(PaymentStatus::Failed),
        (PaymentStatus::Pending, TransactionOutcome::Pending) => None,
    }
}
