pub mod config;
pub mod domain {
    pub mod fulfillment;
    pub mod notification;
    pub mod payment;
    pub mod ref_code;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod completion;
        pub mod ops;
        pub mod payments;
        pub mod webhooks;
    }
    pub mod middleware {
        pub mod admin_auth;
        pub mod rate_limit;
    }
    pub mod routes;
}
pub mod reconcile {
    pub mod state;
    pub mod transitions;
}
pub mod repo {
    pub mod bookings_repo;
    pub mod chat_channels_repo;
    pub mod memory_store;
    pub mod outbox_repo;
    pub mod payments_repo;
    pub mod subscriptions_repo;
    pub mod users_repo;
}
pub mod service {
    pub mod events;
    pub mod fulfillment;
    pub mod outbox_relay;
    pub mod payment_service;
    pub mod reconciler;
}

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
    pub pool: sqlx::PgPool,
    pub redis_client: redis::Client,
    pub app_base_url: String,
}
