use crate::domain::payment::{CreateChargeRequest, PaymentStatusResponse, StatusQuery};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

pub async fn create_payment(
    State(state): State<AppState>,
    Json(req): Json<CreateChargeRequest>,
) -> impl IntoResponse {
    match state.payment_service.create_charge(req).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_payment_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> impl IntoResponse {
    let ref_code = query.ref_code.unwrap_or_default();
    match state.payment_service.get_status(&ref_code).await {
        Ok(payment) => (
            axum::http::StatusCode::OK,
            Json(PaymentStatusResponse { payment }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_user_payments(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.payment_service.list_for_user(user_id).await {
        Ok(payments) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({
                "user_id": user_id,
                "total": payments.len(),
                "payments": payments
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}
