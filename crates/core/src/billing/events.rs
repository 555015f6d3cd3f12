//! Webhook payload parsing.
//!
//! Provider payloads look like `{"type": "...", "data": {"object": {...}}}`.
//! Parsing extracts the subscription identifier and a typed event; unknown
//! event kinds become [`BillingEvent::Ignored`] so the handler can
//! acknowledge them without acting.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::SubscriptionStatus;

/// A malformed or unintelligible webhook payload.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Payload is missing a required field.
    #[error("missing field: {0}")]
    MissingField(&'static str),
    /// Status string outside the known set.
    #[error("unknown subscription status: {0}")]
    UnknownStatus(String),
}

/// Snapshot of subscription fields carried by created/updated events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    /// Provider status.
    pub status: SubscriptionStatus,
    /// Price identifier of the first line item.
    pub price_id: Option<String>,
    /// Current period start.
    pub current_period_start: Option<DateTime<Utc>>,
    /// Current period end.
    pub current_period_end: Option<DateTime<Utc>>,
    /// Cancel-at-period-end flag.
    pub cancel_at_period_end: bool,
}

/// A typed billing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    /// Checkout finished; the subscription exists upstream.
    CheckoutCompleted,
    /// Subscription created upstream.
    SubscriptionCreated(SubscriptionSnapshot),
    /// Subscription mutated upstream (plan change, trial end, cancel flag).
    SubscriptionUpdated(SubscriptionSnapshot),
    /// Subscription terminated upstream.
    SubscriptionDeleted,
    /// An invoice was paid.
    PaymentSucceeded,
    /// An invoice payment failed.
    PaymentFailed,
    /// Recognized envelope, unhandled kind.
    Ignored(String),
}

/// A parsed webhook: the event plus the subscription it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Provider subscription identifier; absent for ignored kinds that carry
    /// none.
    pub external_subscription_id: Option<String>,
    /// The typed event.
    pub event: BillingEvent,
}

fn timestamp(object: &Value, field: &str) -> Option<DateTime<Utc>> {
    object
        .get(field)
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn subscription_snapshot(object: &Value) -> Result<SubscriptionSnapshot, EventError> {
    let status = object
        .get("status")
        .and_then(Value::as_str)
        .ok_or(EventError::MissingField("status"))?
        .parse()?;
    let price_id = object
        .pointer("/items/data/0/price/id")
        .and_then(Value::as_str)
        .map(String::from);
    Ok(SubscriptionSnapshot {
        status,
        price_id,
        current_period_start: timestamp(object, "current_period_start"),
        current_period_end: timestamp(object, "current_period_end"),
        cancel_at_period_end: object
            .get("cancel_at_period_end")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

/// Parses one webhook payload.
pub fn parse(payload: &Value) -> Result<WebhookEvent, EventError> {
    let kind = payload
        .get("type")
        .and_then(Value::as_str)
        .ok_or(EventError::MissingField("type"))?;
    let object = payload
        .pointer("/data/object")
        .ok_or(EventError::MissingField("data.object"))?;

    let (external_subscription_id, event) = match kind {
        "checkout.session.completed" => {
            let id = object
                .get("subscription")
                .and_then(Value::as_str)
                .ok_or(EventError::MissingField("data.object.subscription"))?;
            (Some(id.to_string()), BillingEvent::CheckoutCompleted)
        }
        "customer.subscription.created" | "customer.subscription.updated" => {
            let id = object
                .get("id")
                .and_then(Value::as_str)
                .ok_or(EventError::MissingField("data.object.id"))?;
            let snapshot = subscription_snapshot(object)?;
            let event = if kind == "customer.subscription.created" {
                BillingEvent::SubscriptionCreated(snapshot)
            } else {
                BillingEvent::SubscriptionUpdated(snapshot)
            };
            (Some(id.to_string()), event)
        }
        "customer.subscription.deleted" => {
            let id = object
                .get("id")
                .and_then(Value::as_str)
                .ok_or(EventError::MissingField("data.object.id"))?;
            (Some(id.to_string()), BillingEvent::SubscriptionDeleted)
        }
        "invoice.payment_succeeded" | "invoice.payment_failed" => {
            let id = object
                .get("subscription")
                .and_then(Value::as_str)
                .ok_or(EventError::MissingField("data.object.subscription"))?;
            let event = if kind == "invoice.payment_succeeded" {
                BillingEvent::PaymentSucceeded
            } else {
                BillingEvent::PaymentFailed
            };
            (Some(id.to_string()), event)
        }
        other => {
            let id = object
                .get("subscription")
                .and_then(Value::as_str)
                .or_else(|| object.get("id").and_then(Value::as_str))
                .map(String::from);
            (id, BillingEvent::Ignored(other.to_string()))
        }
    };

    Ok(WebhookEvent {
        external_subscription_id,
        event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_checkout_completed() {
        let payload = json!({
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_1", "subscription": "sub_9"}}
        });

        let parsed = parse(&payload).unwrap();
        assert_eq!(parsed.external_subscription_id.as_deref(), Some("sub_9"));
        assert_eq!(parsed.event, BillingEvent::CheckoutCompleted);
    }

    #[test]
    fn test_parses_subscription_updated_with_snapshot() {
        let payload = json!({
            "type": "customer.subscription.updated",
            "data": {"object": {
                "id": "sub_9",
                "status": "active",
                "current_period_start": 1_717_200_000,
                "current_period_end": 1_719_792_000,
                "cancel_at_period_end": true,
                "items": {"data": [{"price": {"id": "price_pro"}}]}
            }}
        });

        let parsed = parse(&payload).unwrap();
        let BillingEvent::SubscriptionUpdated(snapshot) = parsed.event else {
            panic!("expected updated event");
        };
        assert_eq!(snapshot.status, SubscriptionStatus::Active);
        assert_eq!(snapshot.price_id.as_deref(), Some("price_pro"));
        assert!(snapshot.cancel_at_period_end);
        assert_eq!(
            snapshot.current_period_start,
            DateTime::from_timestamp(1_717_200_000, 0)
        );
    }

    #[test]
    fn test_parses_invoice_events() {
        let ok = json!({
            "type": "invoice.payment_succeeded",
            "data": {"object": {"subscription": "sub_9"}}
        });
        let failed = json!({
            "type": "invoice.payment_failed",
            "data": {"object": {"subscription": "sub_9"}}
        });

        assert_eq!(parse(&ok).unwrap().event, BillingEvent::PaymentSucceeded);
        assert_eq!(parse(&failed).unwrap().event, BillingEvent::PaymentFailed);
    }

    #[test]
    fn test_unknown_kind_is_ignored_not_rejected() {
        let payload = json!({
            "type": "customer.updated",
            "data": {"object": {"id": "cus_3"}}
        });

        let parsed = parse(&payload).unwrap();
        assert_eq!(parsed.event, BillingEvent::Ignored("customer.updated".into()));
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let payload = json!({"data": {"object": {}}});
        assert!(matches!(
            parse(&payload),
            Err(EventError::MissingField("type"))
        ));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let payload = json!({
            "type": "customer.subscription.created",
            "data": {"object": {"id": "sub_9", "status": "galactic"}}
        });
        assert!(matches!(
            parse(&payload),
            Err(EventError::UnknownStatus(_))
        ));
    }
}
