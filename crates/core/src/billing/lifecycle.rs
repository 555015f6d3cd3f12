//! The pure subscription state machine.

use super::events::BillingEvent;
use super::{SubscriptionState, SubscriptionStatus};

/// Folds one event into the current state.
///
/// Total and idempotent: applying the same event to its own result yields an
/// identical state, period timestamps included. Webhook redelivery is
/// therefore harmless.
#[must_use]
pub fn apply(current: Option<&SubscriptionState>, event: &BillingEvent) -> SubscriptionState {
    let mut state = current.cloned().unwrap_or_else(SubscriptionState::initial);

    match event {
        BillingEvent::CheckoutCompleted => {
            // The created/updated events carry the authoritative snapshot;
            // checkout only lifts a fresh record out of incomplete.
            if matches!(
                state.status,
                SubscriptionStatus::Incomplete | SubscriptionStatus::IncompleteExpired
            ) {
                state.status = SubscriptionStatus::Active;
            }
        }
        BillingEvent::SubscriptionCreated(snapshot)
        | BillingEvent::SubscriptionUpdated(snapshot) => {
            state.status = snapshot.status;
            state.cancel_at_period_end = snapshot.cancel_at_period_end;
            if snapshot.price_id.is_some() {
                state.price_id.clone_from(&snapshot.price_id);
            }
            if snapshot.current_period_start.is_some() {
                state.current_period_start = snapshot.current_period_start;
            }
            if snapshot.current_period_end.is_some() {
                state.current_period_end = snapshot.current_period_end;
            }
        }
        BillingEvent::SubscriptionDeleted => {
            state.status = SubscriptionStatus::Canceled;
        }
        BillingEvent::PaymentSucceeded => {
            if matches!(
                state.status,
                SubscriptionStatus::PastDue | SubscriptionStatus::Unpaid
            ) {
                state.status = SubscriptionStatus::Active;
            }
        }
        BillingEvent::PaymentFailed => {
            if state.status == SubscriptionStatus::Active {
                state.status = SubscriptionStatus::PastDue;
            }
        }
        BillingEvent::Ignored(_) => {}
    }

    state
}
