//! Subscription lifecycle.
//!
//! [`events`] parses provider webhooks into [`BillingEvent`]s and
//! [`lifecycle::apply`] folds them into a [`SubscriptionState`]. Both are
//! pure; persistence and signature verification live elsewhere.

pub mod events;
pub mod lifecycle;

#[cfg(test)]
mod lifecycle_props;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use events::{BillingEvent, EventError, WebhookEvent};

/// Provider-aligned subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Created, first payment not finished.
    Incomplete,
    /// First payment window expired.
    IncompleteExpired,
    /// In trial.
    Trialing,
    /// Paid up.
    Active,
    /// Last invoice failed, dunning in progress.
    PastDue,
    /// Dunning exhausted.
    Unpaid,
    /// Terminated.
    Canceled,
    /// Collection paused.
    Paused,
}

impl SubscriptionStatus {
    /// Whether this status occupies the company's single active slot.
    /// `past_due` still does: the subscription is alive while dunning runs.
    #[must_use]
    pub const fn occupies_active_slot(self) -> bool {
        matches!(self, Self::Active | Self::Trialing | Self::PastDue)
    }

    /// Canonical provider string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Unpaid => "unpaid",
            Self::Canceled => "canceled",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incomplete" => Ok(Self::Incomplete),
            "incomplete_expired" => Ok(Self::IncompleteExpired),
            "trialing" => Ok(Self::Trialing),
            "active" => Ok(Self::Active),
            "past_due" => Ok(Self::PastDue),
            "unpaid" => Ok(Self::Unpaid),
            "canceled" => Ok(Self::Canceled),
            "paused" => Ok(Self::Paused),
            other => Err(EventError::UnknownStatus(other.to_string())),
        }
    }
}

/// The locally tracked state of one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionState {
    /// Current status.
    pub status: SubscriptionStatus,
    /// Provider price identifier.
    pub price_id: Option<String>,
    /// Start of the current billing period.
    pub current_period_start: Option<DateTime<Utc>>,
    /// End of the current billing period.
    pub current_period_end: Option<DateTime<Utc>>,
    /// Whether the subscription cancels at the period boundary.
    pub cancel_at_period_end: bool,
}

impl SubscriptionState {
    /// Fresh state before any provider event, awaiting first payment.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            status: SubscriptionStatus::Incomplete,
            price_id: None,
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SubscriptionStatus::Active, true)]
    #[case(SubscriptionStatus::Trialing, true)]
    #[case(SubscriptionStatus::PastDue, true)]
    #[case(SubscriptionStatus::Incomplete, false)]
    #[case(SubscriptionStatus::IncompleteExpired, false)]
    #[case(SubscriptionStatus::Unpaid, false)]
    #[case(SubscriptionStatus::Canceled, false)]
    #[case(SubscriptionStatus::Paused, false)]
    fn test_active_slot_membership(#[case] status: SubscriptionStatus, #[case] expected: bool) {
        assert_eq!(status.occupies_active_slot(), expected);
    }

    #[test]
    fn test_status_round_trips_through_strings() {
        for status in [
            SubscriptionStatus::Incomplete,
            SubscriptionStatus::IncompleteExpired,
            SubscriptionStatus::Trialing,
            SubscriptionStatus::Active,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Unpaid,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::Paused,
        ] {
            assert_eq!(status.as_str().parse::<SubscriptionStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!("superseded".parse::<SubscriptionStatus>().is_err());
    }
}
