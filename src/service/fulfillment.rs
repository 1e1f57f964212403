use crate::domain::fulfillment::Subscription;
use crate::domain::payment::{Payment, PaymentKind};
use crate::repo::bookings_repo::BookingStore;
use crate::repo::chat_channels_repo::ChatChannelStore;
use crate::repo::subscriptions_repo::SubscriptionStore;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    SubscriptionActivated {
        plan_id: String,
        end_date: DateTime<Utc>,
    },
    BookingConfirmed {
        booking_id: Uuid,
        channel_id: Uuid,
    },
    Skipped(&'static str),
}

/// Side effects of a payment that has just become paid.
#[derive(Clone)]
pub struct FulfillmentDispatcher {
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub chat_channels: Arc<dyn ChatChannelStore>,
}

impl FulfillmentDispatcher {
    pub async fn fulfill(&self, payment: &Payment) -> Result<FulfillmentOutcome> {
        match &payment.kind {
            PaymentKind::Subscription { plan_id: None } => Ok(FulfillmentOutcome::Skipped("no plan_id")),
            PaymentKind::Subscription {
                plan_id: Some(plan_id),
            } => {
                let plan = self
                    .subscriptions
                    .find_plan(plan_id)
                    .await?
                    .ok_or_else(|| anyhow!("subscription plan {} not found", plan_id))?;

                let subscription =
                    Subscription::activate(payment.user_id, &plan, &payment.ref_code, Utc::now());
                self.subscriptions.upsert_subscription(&subscription).await?;

                Ok(FulfillmentOutcome::SubscriptionActivated {
                    plan_id: plan.plan_id,
                    end_date: subscription.end_date,
                })
            }
            PaymentKind::Booking { booking_id: None } => Ok(FulfillmentOutcome::Skipped("no booking_id")),
            PaymentKind::Booking {
                booking_id: Some(booking_id),
            } => {
                let parties = self
                    .bookings
                    .mark_paid(*booking_id, &payment.ref_code)
                    .await?
                    .ok_or_else(|| anyhow!("booking {} not found", booking_id))?;

                let channel = self.chat_channels.upsert_channel(&parties).await?;

                Ok(FulfillmentOutcome::BookingConfirmed {
                    booking_id: parties.booking_id,
                    channel_id: channel.id,
                })
            }
            PaymentKind::Other { .. } => Ok(FulfillmentOutcome::Skipped("no fulfillment for payment type")),
        }
    }
}
