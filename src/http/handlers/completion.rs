use crate::domain::notification::CompletionQuery;
use crate::error::PaymentError;
use crate::service::payment_service::{CompletionGuard, CompletionSource};
use crate::AppState;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct TestCompleteRequest {
    pub ref_code: Option<String>,
}

/// Target of the mock checkout redirect: completes the payment and sends the
/// browser to the app's finish page.
pub async fn mock_complete(
    State(state): State<AppState>,
    Query(query): Query<CompletionQuery>,
) -> impl IntoResponse {
    let user_id = match query.user_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                return PaymentError::Validation("user_id must be a UUID".to_string()).into_response()
            }
        },
        None => None,
    };
    let guard = CompletionGuard {
        user_id,
        payment_type: query.payment_type.filter(|t| !t.trim().is_empty()),
    };
    let ref_code = query.ref_code.unwrap_or_default();

    match state
        .payment_service
        .complete_without_gateway(&ref_code, guard, CompletionSource::MockRedirect)
        .await
    {
        Ok(result) => {
            let target = reqwest::Url::parse_with_params(
                &format!("{}/payment/finish", state.app_base_url.trim_end_matches('/')),
                &[
                    ("ref_code", result.payment.ref_code.as_str()),
                    ("status", result.payment.status.as_str()),
                ],
            )
            .map(|u| u.to_string())
            .unwrap_or_else(|_| "/payment/finish".to_string());
            Redirect::to(&target).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Manual completion for testing; answers with JSON.
pub async fn test_complete(
    State(state): State<AppState>,
    Json(req): Json<TestCompleteRequest>,
) -> impl IntoResponse {
    let ref_code = req.ref_code.unwrap_or_default();
    match state
        .payment_service
        .complete_without_gateway(&ref_code, CompletionGuard::default(), CompletionSource::Manual)
        .await
    {
        Ok(result) => (axum::http::StatusCode::OK, Json(result)).into_response(),
        Err(e) => e.into_response(),
    }
}
