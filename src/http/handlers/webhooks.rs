use crate::domain::notification::GatewayNotification;
use crate::error::PaymentError;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

/// Gateway notification receiver. Once the signature and amount check out the
/// gateway gets a 200 even if fulfillment failed locally, as long as that
/// failure was recorded.
pub async fn receive_notification(
    State(state): State<AppState>,
    body: Result<Json<GatewayNotification>, JsonRejection>,
) -> impl IntoResponse {
    let Json(notification) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "unreadable webhook body");
            return PaymentError::Validation("invalid notification body".to_string()).into_response();
        }
    };

    match state.payment_service.handle_notification(notification).await {
        Ok(ack) => (axum::http::StatusCode::OK, Json(ack)).into_response(),
        Err(e) => e.into_response(),
    }
}
