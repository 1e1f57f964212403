mod common;

use common::{
    booking_charge, flaky_service, mock_service, seed_plan, seed_user, service_with,
    signed_notification, subscription_charge, FlakyStore,
};
use ruang_payments::domain::payment::{CreateChargeRequest, PaymentStatus};
use ruang_payments::error::PaymentError;
use ruang_payments::gateways::{CheckoutGateway, CheckoutRequest, CheckoutSession};
use ruang_payments::repo::memory_store::MemoryStore;
use ruang_payments::repo::payments_repo::PaymentStore;
use ruang_payments::repo::subscriptions_repo::SubscriptionStore;
use ruang_payments::service::events::PaymentEventType;
use ruang_payments::service::payment_service::{CompletionGuard, CompletionSource};
use std::sync::Arc;
use uuid::Uuid;

/// Gateway that always hands out a real hosted checkout.
struct LiveSnap;

#[async_trait::async_trait]
impl CheckoutGateway for LiveSnap {
    fn name(&self) -> &'static str {
        "midtrans"
    }

    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        Ok(CheckoutSession {
            token: format!("snap-{}", request.ref_code),
            redirect_url: format!("https://app.sandbox.midtrans.com/snap/v4/redirection/{}", request.ref_code),
            is_mock: false,
        })
    }
}

#[tokio::test]
async fn subscription_checkout_to_activation() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let user = seed_user(&store).await;
    seed_plan(&store, "monthly", 30).await;

    let charge = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();
    assert!(charge.mock_payment);
    assert!(charge.ref_code.starts_with("RUANG-SUBSCRIPTION-"));

    let stored = store.find_by_ref_code(&charge.ref_code).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
    assert_eq!(stored.amount, 150000);
    assert_eq!(stored.id, charge.payment_id);
    assert_eq!(stored.snap_token.as_deref(), Some(charge.snap_token.as_str()));
    assert_eq!(stored.metadata.get("plan_id").and_then(|v| v.as_str()), Some("monthly"));
    assert_eq!(
        stored.metadata.get("redirect_url").and_then(|v| v.as_str()),
        Some(charge.redirect_url.as_str())
    );

    let ack = service
        .handle_notification(signed_notification(&charge.ref_code, "150000", "settlement", Some("accept")))
        .await
        .unwrap();
    assert!(ack.success);

    let paid = store.find_by_ref_code(&charge.ref_code).await.unwrap().unwrap();
    assert_eq!(paid.status, PaymentStatus::Paid);
    assert!(paid.updated_at >= stored.updated_at);

    let sub = store.find_by_user(user).await.unwrap().expect("subscription row");
    assert_eq!(sub.plan_id, "monthly");
    assert_eq!(sub.status, "active");
    assert_eq!(sub.payment_ref, charge.ref_code);
    assert_eq!(sub.end_date - sub.start_date, chrono::Duration::days(30));
    assert!(sub.start_date >= stored.created_at);

    let events = store.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, PaymentEventType::Paid);
    assert_eq!(events[0].source, "webhook");
}

#[tokio::test]
async fn booking_payment_confirms_booking_and_opens_channel() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let user = seed_user(&store).await;
    let professional = Uuid::new_v4();
    let booking = Uuid::new_v4();
    store.add_booking(booking, user, professional).await;

    let charge = service.create_charge(booking_charge(user, booking)).await.unwrap();
    service
        .handle_notification(signed_notification(&charge.ref_code, "250000", "capture", None))
        .await
        .unwrap();

    let row = store.booking(booking).await.unwrap();
    assert_eq!(row.status, "paid");
    assert_eq!(row.payment_ref.as_deref(), Some(charge.ref_code.as_str()));

    let channels = store.channels().await;
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].user_id, user);
    assert_eq!(channels[0].professional_id, professional);
    assert_eq!(channels[0].booking_id, Some(booking));
}

#[tokio::test]
async fn redelivered_webhook_does_not_fulfill_twice() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let user = seed_user(&store).await;
    seed_plan(&store, "monthly", 30).await;
    let charge = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();

    let n = signed_notification(&charge.ref_code, "150000", "settlement", Some("accept"));
    for _ in 0..3 {
        let ack = service.handle_notification(n.clone()).await.unwrap();
        assert!(ack.success);
    }
    assert_eq!(store.subscription_writes().await, 1);
}

#[tokio::test]
async fn bad_signature_changes_nothing() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let user = seed_user(&store).await;
    seed_plan(&store, "monthly", 30).await;
    let charge = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();

    let mut n = signed_notification(&charge.ref_code, "150000", "settlement", Some("accept"));
    n.gross_amount = serde_json::json!("1");
    let out = service.handle_notification(n).await;
    assert!(matches!(out, Err(PaymentError::InvalidSignature)));

    let stored = store.find_by_ref_code(&charge.ref_code).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
    assert_eq!(store.subscription_writes().await, 0);
}

#[tokio::test]
async fn webhook_for_unknown_order_is_not_found() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let out = service
        .handle_notification(signed_notification("RUANG-BOOKING-1-NOPE00", "1000", "settlement", None))
        .await;
    assert!(matches!(out, Err(PaymentError::PaymentNotFound)));
}

#[tokio::test]
async fn fulfillment_failure_keeps_payment_paid_and_is_reported() {
    let store = FlakyStore::default();
    let service = flaky_service(&store);
    let user = seed_user(&store.inner).await;
    seed_plan(&store.inner, "monthly", 30).await;
    let charge = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();

    store.fail_fulfillment_writes(true);
    let ack = service
        .handle_notification(signed_notification(&charge.ref_code, "150000", "settlement", Some("accept")))
        .await
        .unwrap();
    assert!(ack.success);
    assert!(ack.message.contains("follow-up"));

    let stored = store.inner.find_by_ref_code(&charge.ref_code).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Paid);

    let events = store.inner.events().await;
    let kinds: Vec<PaymentEventType> = events.iter().map(|e| e.event_type).collect();
    assert!(kinds.contains(&PaymentEventType::Paid));
    assert!(kinds.contains(&PaymentEventType::FulfillmentFailed));
    let failure = events
        .iter()
        .find(|e| e.event_type == PaymentEventType::FulfillmentFailed)
        .unwrap();
    assert!(failure.detail.as_deref().unwrap_or("").contains("unavailable"));
}

#[tokio::test]
async fn paid_event_is_recorded_with_the_transition() {
    let store = FlakyStore::default();
    let service = flaky_service(&store);
    let user = seed_user(&store.inner).await;
    seed_plan(&store.inner, "monthly", 30).await;
    let charge = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();

    // The sink is down but fulfillment succeeds: the paid event still lands.
    store.fail_event_writes(true);
    let ack = service
        .handle_notification(signed_notification(&charge.ref_code, "150000", "settlement", Some("accept")))
        .await
        .unwrap();
    assert!(ack.success);

    let events = store.inner.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, PaymentEventType::Paid);
    assert_eq!(events[0].ref_code, charge.ref_code);
    assert_eq!(events[0].amount, 150000);
}

#[tokio::test]
async fn unrecordable_fulfillment_failure_is_an_error() {
    let store = FlakyStore::default();
    let service = flaky_service(&store);
    let user = seed_user(&store.inner).await;
    seed_plan(&store.inner, "monthly", 30).await;
    let charge = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();

    store.fail_fulfillment_writes(true);
    store.fail_event_writes(true);
    let out = service
        .handle_notification(signed_notification(&charge.ref_code, "150000", "settlement", Some("accept")))
        .await;
    assert!(matches!(out, Err(PaymentError::Store(_))));

    let stored = store.inner.find_by_ref_code(&charge.ref_code).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Paid);
    let kinds: Vec<PaymentEventType> = store.inner.events().await.iter().map(|e| e.event_type).collect();
    assert_eq!(kinds, vec![PaymentEventType::Paid]);
}

#[tokio::test]
async fn notification_amount_must_match_payment() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let user = seed_user(&store).await;
    seed_plan(&store, "monthly", 30).await;
    let charge = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();

    let out = service
        .handle_notification(signed_notification(&charge.ref_code, "1000.00", "settlement", Some("accept")))
        .await;
    assert!(matches!(out, Err(PaymentError::Validation(m)) if m.contains("gross_amount")));

    let stored = store.find_by_ref_code(&charge.ref_code).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
    assert_eq!(store.subscription_writes().await, 0);
    assert!(store.events().await.is_empty());

    let ack = service
        .handle_notification(signed_notification(&charge.ref_code, "150000.00", "settlement", Some("accept")))
        .await
        .unwrap();
    assert_eq!(ack.message, "payment marked paid");
}

#[tokio::test]
async fn unknown_plan_is_a_fulfillment_failure_not_a_rollback() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let user = seed_user(&store).await;
    let charge = service.create_charge(subscription_charge(user, "lifetime")).await.unwrap();

    let result = service
        .complete_without_gateway(&charge.ref_code, CompletionGuard::default(), CompletionSource::Manual)
        .await
        .unwrap();
    assert!(result.newly_paid);
    assert_eq!(result.payment.status, PaymentStatus::Paid);
    assert!(result.fulfillment_error.unwrap().contains("lifetime"));
}

#[tokio::test]
async fn payment_without_linkage_is_just_marked_paid() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let user = seed_user(&store).await;
    let charge = service
        .create_charge(CreateChargeRequest {
            user_id: Some(user.to_string()),
            amount: Some(99_000.0),
            payment_type: Some("booking".to_string()),
            metadata: None,
        })
        .await
        .unwrap();

    let result = service
        .complete_without_gateway(&charge.ref_code, CompletionGuard::default(), CompletionSource::Manual)
        .await
        .unwrap();
    assert!(result.newly_paid);
    assert!(result.fulfillment_error.is_none());
    assert!(store.channels().await.is_empty());
}

#[tokio::test]
async fn failed_payment_cannot_be_completed_manually() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let user = seed_user(&store).await;
    seed_plan(&store, "monthly", 30).await;
    let charge = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();

    service
        .handle_notification(signed_notification(&charge.ref_code, "150000", "deny", None))
        .await
        .unwrap();

    let result = service
        .complete_without_gateway(&charge.ref_code, CompletionGuard::default(), CompletionSource::Manual)
        .await
        .unwrap();
    assert!(!result.newly_paid);
    assert_eq!(result.payment.status, PaymentStatus::Failed);
    assert_eq!(store.subscription_writes().await, 0);
}

#[tokio::test]
async fn mock_redirect_checks_user_and_type() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let user = seed_user(&store).await;
    seed_plan(&store, "monthly", 30).await;
    let charge = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();

    let wrong_user = CompletionGuard {
        user_id: Some(Uuid::new_v4()),
        payment_type: None,
    };
    let out = service
        .complete_without_gateway(&charge.ref_code, wrong_user, CompletionSource::MockRedirect)
        .await;
    assert!(matches!(out, Err(PaymentError::Validation(_))));

    let wrong_type = CompletionGuard {
        user_id: Some(user),
        payment_type: Some("booking".to_string()),
    };
    let out = service
        .complete_without_gateway(&charge.ref_code, wrong_type, CompletionSource::MockRedirect)
        .await;
    assert!(matches!(out, Err(PaymentError::Validation(_))));
    assert_eq!(
        store.find_by_ref_code(&charge.ref_code).await.unwrap().unwrap().status,
        PaymentStatus::Pending
    );

    let ok = CompletionGuard {
        user_id: Some(user),
        payment_type: Some("SUBSCRIPTION".to_string()),
    };
    let result = service
        .complete_without_gateway(&charge.ref_code, ok, CompletionSource::MockRedirect)
        .await
        .unwrap();
    assert!(result.newly_paid);
    assert!(store.find_by_user(user).await.unwrap().is_some());
}

#[tokio::test]
async fn mock_redirect_cannot_complete_live_checkout() {
    let store = MemoryStore::new();
    let service = service_with(&store, Arc::new(LiveSnap));
    let user = seed_user(&store).await;
    seed_plan(&store, "yearly", 365).await;
    let charge = service.create_charge(subscription_charge(user, "yearly")).await.unwrap();
    assert!(!charge.mock_payment);

    let guard = CompletionGuard {
        user_id: Some(user),
        payment_type: Some("subscription".to_string()),
    };
    let out = service
        .complete_without_gateway(&charge.ref_code, guard, CompletionSource::MockRedirect)
        .await;
    assert!(matches!(out, Err(PaymentError::Validation(_))));
    assert_eq!(
        store.find_by_ref_code(&charge.ref_code).await.unwrap().unwrap().status,
        PaymentStatus::Pending
    );
    assert!(store.find_by_user(user).await.unwrap().is_none());
    assert!(store.events().await.is_empty());

    let result = service
        .complete_without_gateway(&charge.ref_code, CompletionGuard::default(), CompletionSource::Manual)
        .await
        .unwrap();
    assert!(result.newly_paid);
}

#[tokio::test]
async fn create_charge_rejects_bad_input() {
    let store = MemoryStore::new();
    let service = mock_service(&store);

    let out = service.create_charge(CreateChargeRequest::default()).await;
    assert!(matches!(out, Err(PaymentError::Validation(_))));

    let out = service
        .create_charge(subscription_charge(Uuid::new_v4(), "monthly"))
        .await;
    assert!(matches!(out, Err(PaymentError::UserNotFound)));

    let user = seed_user(&store).await;
    let mut req = subscription_charge(user, "monthly");
    req.amount = Some(0.0);
    let out = service.create_charge(req).await;
    assert!(matches!(out, Err(PaymentError::Validation(_))));
    assert!(store.list_by_user(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn status_and_history_are_read_only() {
    let store = MemoryStore::new();
    let service = mock_service(&store);
    let user = seed_user(&store).await;
    let first = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();
    let second = service.create_charge(subscription_charge(user, "monthly")).await.unwrap();

    let view = service.get_status(&first.ref_code).await.unwrap();
    assert_eq!(view.status, PaymentStatus::Pending);
    assert_eq!(view.payment_type, "subscription");

    let history = service.list_for_user(user).await.unwrap();
    assert_eq!(history.len(), 2);
    let refs: Vec<&str> = history.iter().map(|p| p.ref_code.as_str()).collect();
    assert!(refs.contains(&first.ref_code.as_str()));
    assert!(refs.contains(&second.ref_code.as_str()));

    assert!(matches!(
        service.get_status("RUANG-NOPE").await,
        Err(PaymentError::PaymentNotFound)
    ));
    assert!(store.events().await.is_empty());
}
