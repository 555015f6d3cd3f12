//! Property-based tests for the subscription state machine.
//!
//! The fold must be total and idempotent over arbitrary event histories so
//! webhook redelivery and out-of-order bursts can never corrupt local state.

use proptest::prelude::*;

use crate::billing::events::{BillingEvent, SubscriptionSnapshot};
use crate::billing::lifecycle::apply;
use crate::billing::{SubscriptionState, SubscriptionStatus};

fn arb_status() -> impl Strategy<Value = SubscriptionStatus> {
    prop_oneof![
        Just(SubscriptionStatus::Incomplete),
        Just(SubscriptionStatus::IncompleteExpired),
        Just(SubscriptionStatus::Trialing),
        Just(SubscriptionStatus::Active),
        Just(SubscriptionStatus::PastDue),
        Just(SubscriptionStatus::Unpaid),
        Just(SubscriptionStatus::Canceled),
        Just(SubscriptionStatus::Paused),
    ]
}

fn arb_snapshot() -> impl Strategy<Value = SubscriptionSnapshot> {
    (
        arb_status(),
        proptest::option::of("price_[a-z]{6}"),
        proptest::option::of(1_500_000_000i64..1_900_000_000i64),
        proptest::option::of(1_500_000_000i64..1_900_000_000i64),
        any::<bool>(),
    )
        .prop_map(|(status, price_id, start, end, cancel_at_period_end)| {
            SubscriptionSnapshot {
                status,
                price_id,
                current_period_start: start.and_then(|s| chrono::DateTime::from_timestamp(s, 0)),
                current_period_end: end.and_then(|s| chrono::DateTime::from_timestamp(s, 0)),
                cancel_at_period_end,
            }
        })
}

fn arb_event() -> impl Strategy<Value = BillingEvent> {
    prop_oneof![
        Just(BillingEvent::CheckoutCompleted),
        arb_snapshot().prop_map(BillingEvent::SubscriptionCreated),
        arb_snapshot().prop_map(BillingEvent::SubscriptionUpdated),
        Just(BillingEvent::SubscriptionDeleted),
        Just(BillingEvent::PaymentSucceeded),
        Just(BillingEvent::PaymentFailed),
        "[a-z]+\\.[a-z]+".prop_map(BillingEvent::Ignored),
    ]
}

fn fold(events: &[BillingEvent]) -> SubscriptionState {
    events.iter().fold(SubscriptionState::initial(), |state, event| {
        apply(Some(&state), event)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Redelivering any event to its own result changes nothing, period
    /// timestamps included.
    #[test]
    fn prop_apply_is_idempotent(
        history in proptest::collection::vec(arb_event(), 0..8),
        event in arb_event(),
    ) {
        let before = fold(&history);
        let once = apply(Some(&before), &event);
        let twice = apply(Some(&once), &event);
        prop_assert_eq!(&once, &twice);
    }

    /// A deletion terminates the subscription regardless of what came before.
    #[test]
    fn prop_deleted_always_cancels(
        history in proptest::collection::vec(arb_event(), 0..8),
    ) {
        let state = fold(&history);
        let state = apply(Some(&state), &BillingEvent::SubscriptionDeleted);
        prop_assert_eq!(state.status, SubscriptionStatus::Canceled);
    }

    /// Payment failure only ever demotes an active subscription; every other
    /// status is left untouched.
    #[test]
    fn prop_payment_failed_only_demotes_active(
        history in proptest::collection::vec(arb_event(), 0..8),
    ) {
        let before = fold(&history);
        let after = apply(Some(&before), &BillingEvent::PaymentFailed);
        if before.status == SubscriptionStatus::Active {
            prop_assert_eq!(after.status, SubscriptionStatus::PastDue);
        } else {
            prop_assert_eq!(after.status, before.status);
        }
    }

    /// Provider snapshots are authoritative for status and the cancel flag.
    #[test]
    fn prop_snapshot_sets_status(
        history in proptest::collection::vec(arb_event(), 0..8),
        snapshot in arb_snapshot(),
    ) {
        let before = fold(&history);
        let after = apply(
            Some(&before),
            &BillingEvent::SubscriptionUpdated(snapshot.clone()),
        );
        prop_assert_eq!(after.status, snapshot.status);
        prop_assert_eq!(after.cancel_at_period_end, snapshot.cancel_at_period_end);
    }

    /// Period timestamps, once learned, survive snapshots that omit them.
    #[test]
    fn prop_periods_are_never_cleared(
        history in proptest::collection::vec(arb_event(), 1..8),
        mut snapshot in arb_snapshot(),
    ) {
        let before = fold(&history);
        snapshot.current_period_start = None;
        snapshot.current_period_end = None;
        let after = apply(Some(&before), &BillingEvent::SubscriptionUpdated(snapshot));
        prop_assert_eq!(after.current_period_start, before.current_period_start);
        prop_assert_eq!(after.current_period_end, before.current_period_end);
    }

    /// Unrecognized provider events are inert.
    #[test]
    fn prop_ignored_events_are_inert(
        history in proptest::collection::vec(arb_event(), 0..8),
        kind in "[a-z]+\\.[a-z]+",
    ) {
        let before = fold(&history);
        let after = apply(Some(&before), &BillingEvent::Ignored(kind));
        prop_assert_eq!(after, before);
    }
}
