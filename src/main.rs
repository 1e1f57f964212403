use ruang_payments::config::AppConfig;
use ruang_payments::gateways::midtrans::MidtransGateway;
use ruang_payments::gateways::mock::MockCheckoutGateway;
use ruang_payments::gateways::CheckoutGateway;
use ruang_payments::http::middleware::rate_limit::RateLimitState;
use ruang_payments::http::routes::router;
use ruang_payments::repo::bookings_repo::BookingsRepo;
use ruang_payments::repo::chat_channels_repo::ChatChannelsRepo;
use ruang_payments::repo::outbox_repo::OutboxRepo;
use ruang_payments::repo::payments_repo::PaymentsRepo;
use ruang_payments::repo::subscriptions_repo::SubscriptionsRepo;
use ruang_payments::repo::users_repo::UsersRepo;
use ruang_payments::service::fulfillment::FulfillmentDispatcher;
use ruang_payments::service::payment_service::PaymentService;
use ruang_payments::service::reconciler::Reconciler;
use ruang_payments::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let gateway: Arc<dyn CheckoutGateway> = if cfg.uses_mock_gateway() {
        tracing::warn!("PAYMENT_GATEWAY=mock, every checkout will be a mock payment");
        Arc::new(MockCheckoutGateway {
            app_base_url: cfg.app_base_url.clone(),
        })
    } else {
        Arc::new(MidtransGateway {
            base_url: cfg.midtrans_base_url.clone(),
            server_key: cfg.midtrans_server_key.clone(),
            app_base_url: cfg.app_base_url.clone(),
            timeout_ms: cfg.gateway_timeout_ms,
            client: reqwest::Client::new(),
        })
    };

    let payments_repo = Arc::new(PaymentsRepo { pool: pool.clone() });
    let fulfillment = FulfillmentDispatcher {
        subscriptions: Arc::new(SubscriptionsRepo { pool: pool.clone() }),
        bookings: Arc::new(BookingsRepo { pool: pool.clone() }),
        chat_channels: Arc::new(ChatChannelsRepo { pool: pool.clone() }),
    };

    let payment_service = PaymentService {
        payments: payments_repo.clone(),
        users: Arc::new(UsersRepo { pool: pool.clone() }),
        gateway,
        reconciler: Reconciler::new(payments_repo),
        fulfillment,
        events: Arc::new(OutboxRepo { pool: pool.clone() }),
        server_key: cfg.midtrans_server_key.clone(),
    };

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;
    let state = AppState {
        payment_service,
        pool,
        redis_client: redis_client.clone(),
        app_base_url: cfg.app_base_url.clone(),
    };

    let app = router(
        state,
        cfg.internal_api_key.clone(),
        Some(RateLimitState {
            redis_client,
            max_per_minute: cfg.rate_limit_per_minute,
        }),
    );

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
