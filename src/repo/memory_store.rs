use crate::domain::fulfillment::{BookingParties, ChatChannel, Subscription, SubscriptionPlan, UserProfile};
use crate::domain::payment::{NewPayment, Payment, PaymentStatus};
use crate::repo::bookings_repo::BookingStore;
use crate::repo::chat_channels_repo::ChatChannelStore;
use crate::repo::payments_repo::PaymentStore;
use crate::repo::subscriptions_repo::SubscriptionStore;
use crate::repo::users_repo::UserDirectory;
use crate::service::events::{PaymentEventSink, PaymentLifecycleEvent};
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct BookingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub professional_id: Uuid,
    pub status: String,
    pub payment_ref: Option<String>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, UserProfile>,
    payments: HashMap<String, Payment>,
    plans: HashMap<String, SubscriptionPlan>,
    subscriptions: HashMap<Uuid, Subscription>,
    subscription_writes: usize,
    bookings: HashMap<Uuid, BookingRow>,
    channels: HashMap<(Uuid, Uuid), ChatChannel>,
    channel_writes: usize,
    events: Vec<PaymentLifecycleEvent>,
}

/// Every store behind one lock. Backs the integration tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: UserProfile) {
        self.inner.lock().await.users.insert(user.id, user);
    }

    pub async fn add_plan(&self, plan: SubscriptionPlan) {
        self.inner.lock().await.plans.insert(plan.plan_id.clone(), plan);
    }

    pub async fn add_booking(&self, id: Uuid, user_id: Uuid, professional_id: Uuid) {
        self.inner.lock().await.bookings.insert(
            id,
            BookingRow {
                id,
                user_id,
                professional_id,
                status: "scheduled".to_string(),
                payment_ref: None,
            },
        );
    }

    pub async fn booking(&self, id: Uuid) -> Option<BookingRow> {
        self.inner.lock().await.bookings.get(&id).cloned()
    }

    pub async fn subscription_writes(&self) -> usize {
        self.inner.lock().await.subscription_writes
    }

    pub async fn channels(&self) -> Vec<ChatChannel> {
        self.inner.lock().await.channels.values().cloned().collect()
    }

    pub async fn channel_writes(&self) -> usize {
        self.inner.lock().await.channel_writes
    }

    pub async fn events(&self) -> Vec<PaymentLifecycleEvent> {
        self.inner.lock().await.events.clone()
    }
}

#[async_trait::async_trait]
impl PaymentStore for MemoryStore {
    async fn insert(&self, payment: &NewPayment) -> Result<Payment> {
        let mut state = self.inner.lock().await;
        if state.payments.contains_key(&payment.ref_code) {
            bail!("duplicate ref_code {}", payment.ref_code);
        }
        let now = chrono::Utc::now();
        let stored = Payment {
            id: payment.id,
            ref_code: payment.ref_code.clone(),
            user_id: payment.user_id,
            amount: payment.amount,
            kind: payment.kind.clone(),
            status: PaymentStatus::Pending,
            metadata: payment.metadata.clone(),
            snap_token: payment.snap_token.clone(),
            qris_link: payment.qris_link.clone(),
            created_at: now,
            updated_at: now,
        };
        state.payments.insert(stored.ref_code.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_ref_code(&self, ref_code: &str) -> Result<Option<Payment>> {
        Ok(self.inner.lock().await.payments.get(ref_code).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>> {
        let state = self.inner.lock().await;
        let mut out: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn update_status_if_pending(
        &self,
        ref_code: &str,
        status: PaymentStatus,
        event: Option<&PaymentLifecycleEvent>,
    ) -> Result<Option<Payment>> {
        let mut state = self.inner.lock().await;
        let updated = match state.payments.get_mut(ref_code) {
            Some(p) if p.status == PaymentStatus::Pending => {
                p.status = status;
                p.updated_at = chrono::Utc::now();
                p.clone()
            }
            _ => return Ok(None),
        };
        if let Some(event) = event {
            record_event(&mut state.events, event.clone());
        }
        Ok(Some(updated))
    }
}

#[async_trait::async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self.inner.lock().await.users.get(&user_id).cloned())
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_plan(&self, plan_id: &str) -> Result<Option<SubscriptionPlan>> {
        Ok(self.inner.lock().await.plans.get(plan_id).cloned())
    }

    async fn upsert_subscription(&self, subscription: &Subscription) -> Result<()> {
        let mut state = self.inner.lock().await;
        state.subscription_writes += 1;
        state
            .subscriptions
            .insert(subscription.user_id, subscription.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Subscription>> {
        Ok(self.inner.lock().await.subscriptions.get(&user_id).cloned())
    }
}

#[async_trait::async_trait]
impl BookingStore for MemoryStore {
    async fn mark_paid(&self, booking_id: Uuid, payment_ref: &str) -> Result<Option<BookingParties>> {
        let mut state = self.inner.lock().await;
        Ok(state.bookings.get_mut(&booking_id).map(|b| {
            b.status = "paid".to_string();
            b.payment_ref = Some(payment_ref.to_string());
            BookingParties {
                booking_id: b.id,
                user_id: b.user_id,
                professional_id: b.professional_id,
            }
        }))
    }
}

#[async_trait::async_trait]
impl ChatChannelStore for MemoryStore {
    async fn upsert_channel(&self, parties: &BookingParties) -> Result<ChatChannel> {
        let mut state = self.inner.lock().await;
        state.channel_writes += 1;
        let channel = state
            .channels
            .entry((parties.user_id, parties.professional_id))
            .or_insert_with(|| ChatChannel {
                id: Uuid::new_v4(),
                user_id: parties.user_id,
                professional_id: parties.professional_id,
                booking_id: Some(parties.booking_id),
                created_at: chrono::Utc::now(),
            });
        channel.booking_id = Some(parties.booking_id);
        Ok(channel.clone())
    }
}

#[async_trait::async_trait]
impl PaymentEventSink for MemoryStore {
    async fn publish(&self, event: PaymentLifecycleEvent) -> Result<()> {
        record_event(&mut self.inner.lock().await.events, event);
        Ok(())
    }
}

/// Same dedup key as the outbox table: one row per `(ref_code, event_type)`.
fn record_event(events: &mut Vec<PaymentLifecycleEvent>, event: PaymentLifecycleEvent) {
    let duplicate = events
        .iter()
        .any(|e| e.ref_code == event.ref_code && e.event_type == event.event_type);
    if !duplicate {
        events.push(event);
    }
}
