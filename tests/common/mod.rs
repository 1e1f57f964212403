#![allow(dead_code)]

use ruang_payments::domain::fulfillment::{
    BookingParties, ChatChannel, Subscription, SubscriptionPlan, UserProfile,
};
use ruang_payments::domain::notification::GatewayNotification;
use ruang_payments::domain::payment::CreateChargeRequest;
use ruang_payments::gateways::mock::MockCheckoutGateway;
use ruang_payments::gateways::signature::compute_signature;
use ruang_payments::gateways::CheckoutGateway;
use ruang_payments::repo::bookings_repo::BookingStore;
use ruang_payments::repo::chat_channels_repo::ChatChannelStore;
use ruang_payments::repo::memory_store::MemoryStore;
use ruang_payments::repo::subscriptions_repo::SubscriptionStore;
use ruang_payments::service::events::{PaymentEventSink, PaymentLifecycleEvent};
use ruang_payments::service::fulfillment::FulfillmentDispatcher;
use ruang_payments::service::payment_service::PaymentService;
use ruang_payments::service::reconciler::Reconciler;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub const SERVER_KEY: &str = "SB-Mid-server-testsecret";
pub const APP_BASE_URL: &str = "http://localhost:3000";

pub fn service_with(store: &MemoryStore, gateway: Arc<dyn CheckoutGateway>) -> PaymentService {
    let shared = Arc::new(store.clone());
    PaymentService {
        payments: shared.clone(),
        users: shared.clone(),
        gateway,
        reconciler: Reconciler::new(shared.clone()),
        fulfillment: FulfillmentDispatcher {
            subscriptions: shared.clone(),
            bookings: shared.clone(),
            chat_channels: shared.clone(),
        },
        events: shared,
        server_key: Some(SERVER_KEY.to_string()),
    }
}

pub fn mock_service(store: &MemoryStore) -> PaymentService {
    service_with(
        store,
        Arc::new(MockCheckoutGateway {
            app_base_url: APP_BASE_URL.to_string(),
        }),
    )
}

pub async fn seed_user(store: &MemoryStore) -> Uuid {
    let id = Uuid::new_v4();
    store
        .add_user(UserProfile {
            id,
            full_name: Some("Raka Pratama".to_string()),
            email: Some("raka@example.com".to_string()),
        })
        .await;
    id
}

pub async fn seed_plan(store: &MemoryStore, plan_id: &str, duration_days: i32) {
    store
        .add_plan(SubscriptionPlan {
            plan_id: plan_id.to_string(),
            name: plan_id.to_string(),
            duration_days,
        })
        .await;
}

pub fn subscription_charge(user_id: Uuid, plan_id: &str) -> CreateChargeRequest {
    CreateChargeRequest {
        user_id: Some(user_id.to_string()),
        amount: Some(150000.0),
        payment_type: Some("subscription".to_string()),
        metadata: json!({ "plan_id": plan_id }).as_object().cloned(),
    }
}

pub fn booking_charge(user_id: Uuid, booking_id: Uuid) -> CreateChargeRequest {
    CreateChargeRequest {
        user_id: Some(user_id.to_string()),
        amount: Some(250000.0),
        payment_type: Some("booking".to_string()),
        metadata: json!({ "booking_id": booking_id.to_string() }).as_object().cloned(),
    }
}

pub fn signed_notification(
    order_id: &str,
    gross_amount: &str,
    transaction_status: &str,
    fraud_status: Option<&str>,
) -> GatewayNotification {
    let status_code = if transaction_status == "pending" { "201" } else { "200" };
    GatewayNotification {
        order_id: order_id.to_string(),
        status_code: status_code.to_string(),
        gross_amount: json!(gross_amount),
        signature_key: compute_signature(order_id, status_code, gross_amount, SERVER_KEY),
        transaction_status: transaction_status.to_string(),
        fraud_status: fraud_status.map(str::to_string),
    }
}

/// Memory store whose fulfillment and event-sink writes can be switched to
/// fail, while payments and lookups keep working.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_fulfillment: Arc<AtomicBool>,
    fail_events: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn fail_fulfillment_writes(&self, fail: bool) {
        self.fail_fulfillment.store(fail, Ordering::SeqCst);
    }

    pub fn fail_event_writes(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::SeqCst);
    }

    fn check_fulfillment(&self, table: &str) -> anyhow::Result<()> {
        if self.fail_fulfillment.load(Ordering::SeqCst) {
            anyhow::bail!("{} table unavailable", table);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for FlakyStore {
    async fn find_plan(&self, plan_id: &str) -> anyhow::Result<Option<SubscriptionPlan>> {
        self.inner.find_plan(plan_id).await
    }

    async fn upsert_subscription(&self, subscription: &Subscription) -> anyhow::Result<()> {
        self.check_fulfillment("subscriptions")?;
        self.inner.upsert_subscription(subscription).await
    }

    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Subscription>> {
        SubscriptionStore::find_by_user(&self.inner, user_id).await
    }
}

#[async_trait::async_trait]
impl BookingStore for FlakyStore {
    async fn mark_paid(&self, booking_id: Uuid, payment_ref: &str) -> anyhow::Result<Option<BookingParties>> {
        self.check_fulfillment("bookings")?;
        self.inner.mark_paid(booking_id, payment_ref).await
    }
}

#[async_trait::async_trait]
impl ChatChannelStore for FlakyStore {
    async fn upsert_channel(&self, parties: &BookingParties) -> anyhow::Result<ChatChannel> {
        self.check_fulfillment("chat_channels")?;
        self.inner.upsert_channel(parties).await
    }
}

#[async_trait::async_trait]
impl PaymentEventSink for FlakyStore {
    async fn publish(&self, event: PaymentLifecycleEvent) -> anyhow::Result<()> {
        if self.fail_events.load(Ordering::SeqCst) {
            anyhow::bail!("payment_events_outbox unavailable");
        }
        self.inner.publish(event).await
    }
}

pub fn flaky_service(store: &FlakyStore) -> PaymentService {
    let base = mock_service(&store.inner);
    let flaky = Arc::new(store.clone());
    PaymentService {
        fulfillment: FulfillmentDispatcher {
            subscriptions: flaky.clone(),
            bookings: flaky.clone(),
            chat_channels: flaky.clone(),
        },
        events: flaky,
        ..base
    }
}
