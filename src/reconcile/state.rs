use serde::{Deserialize, Serialize};

/// Gateway-reported transaction outcome after folding in the fraud signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionOutcome {
    Settled,
    Pending,
    Failed,
}

pub fn map_gateway_status(transaction_status: &str, fraud_status: Option<&str>) -> TransactionOutcome {
    match transaction_status {
        "capture" | "settlement" => match fraud_status.map(str::trim).filter(|f| !f.is_empty()) {
            None | Some("accept") => TransactionOutcome::Settled,
            Some(_) => TransactionOutcome::Pending,
        },
        "deny" | "expire" | "cancel" => TransactionOutcome::Failed,
        _ => TransactionOutcome::Pending,
    }
}
