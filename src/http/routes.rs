use crate::http::handlers::{completion, ops, payments, webhooks};
use crate::http::middleware::{admin_auth, rate_limit};
use crate::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

pub fn router(
    state: AppState,
    internal_api_key: String,
    rate_limit: Option<rate_limit::RateLimitState>,
) -> Router {
    let mut charge_routes: Router<AppState> = Router::new().route("/api/payments", post(payments::create_payment));
    if let Some(limit) = rate_limit {
        charge_routes = charge_routes.layer(from_fn_with_state(limit, rate_limit::enforce));
    }

    let admin_routes: Router<AppState> = Router::new()
        .route("/api/payments/test-complete", post(completion::test_complete))
        .layer(from_fn_with_state(
            internal_api_key,
            admin_auth::require_internal_api_key,
        ));

    Router::new()
        .route("/health", get(payments::health))
        .route("/api/payments/status", get(payments::get_payment_status))
        .route("/api/users/:user_id/payments", get(payments::list_user_payments))
        .route("/api/payments/webhook", post(webhooks::receive_notification))
        .route("/api/payments/mock-complete", get(completion::mock_complete))
        .route("/ops/readiness", get(ops::readiness))
        .route("/ops/liveness", get(ops::liveness))
        .merge(charge_routes)
        .merge(admin_routes)
        .with_state(state)
}
