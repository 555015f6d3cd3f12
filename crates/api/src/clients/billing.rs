//! Billing provider (Stripe-compatible) client.
//!
//! Checkout sessions, subscription changes, and webhook signature
//! verification. Transport failures surface as `UpstreamUnavailable`; the
//! billing provider cannot degrade the way the LLM can.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use projextpal_shared::AppError;
use projextpal_shared::config::BillingConfig;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted skew between the signature timestamp and now.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// A created checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session id.
    pub id: String,
    /// Hosted payment page the caller redirects to.
    pub url: String,
    /// Provider subscription id, when the session created one eagerly.
    #[serde(default)]
    pub subscription: Option<String>,
    /// Provider customer id.
    #[serde(default)]
    pub customer: Option<String>,
}

/// Billing API client.
#[derive(Debug, Clone)]
pub struct BillingClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl BillingClient {
    /// Builds a client from configuration.
    #[must_use]
    pub fn new(config: &BillingConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.clone(),
        }
    }

    /// Creates a subscription-mode checkout session for a price.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamUnavailable` on transport or provider failure.
    pub async fn create_checkout_session(
        &self,
        customer_email: &str,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, AppError> {
        let params = [
            ("mode", "subscription"),
            ("customer_email", customer_email),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
        ];

        let response = self
            .http
            .post(format!("{}/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "billing provider returned {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))
    }

    /// Swaps a subscription onto a new price with proration.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamUnavailable` on transport or provider failure.
    pub async fn update_subscription_price(
        &self,
        subscription_id: &str,
        item_id: &str,
        price_id: &str,
    ) -> Result<Value, AppError> {
        let params = [
            ("items[0][id]", item_id),
            ("items[0][price]", price_id),
            ("proration_behavior", "create_prorations"),
        ];

        self.post_form(&format!("subscriptions/{subscription_id}"), &params)
            .await
    }

    /// Flags or clears cancellation at the period boundary, or cancels
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamUnavailable` on transport or provider failure.
    pub async fn cancel_subscription(
        &self,
        subscription_id: &str,
        at_period_end: bool,
    ) -> Result<Value, AppError> {
        if at_period_end {
            self.post_form(
                &format!("subscriptions/{subscription_id}"),
                &[("cancel_at_period_end", "true")],
            )
            .await
        } else {
            let response = self
                .http
                .delete(format!("{}/subscriptions/{subscription_id}", self.api_base))
                .basic_auth(&self.secret_key, None::<&str>)
                .send()
                .await
                .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?;
            Self::read_json(response).await
        }
    }

    /// Fetches the provider's view of a subscription, for reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamUnavailable` on transport or provider failure.
    pub async fn fetch_subscription(&self, subscription_id: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .get(format!("{}/subscriptions/{subscription_id}", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?;
        Self::read_json(response).await
    }

    async fn post_form(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, AppError> {
        let response = self
            .http
            .post(format!("{}/{path}", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(params)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?;
        Self::read_json(response).await
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, AppError> {
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "billing provider returned {status}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))
    }
}

/// Verifies a webhook signature header of the form `t=<unix>,v1=<hex>`.
///
/// The signed message is `"{t}.{payload}"` under HMAC-SHA256 with the shared
/// webhook secret. The comparison is constant-time and the timestamp must be
/// within [`SIGNATURE_TOLERANCE_SECS`] of `now`.
#[must_use]
pub fn verify_webhook_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now_unix: i64,
) -> bool {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<Vec<u8>> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signature = hex::decode(value).ok(),
            _ => {}
        }
    }

    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return false;
    };

    if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return false;
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    mac.verify_slice(&signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn sign(timestamp: i64, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).expect("any key length works");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={signature}")
    }

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"type":"invoice.payment_succeeded"}"#;
        let header = sign(1_700_000_000, payload);
        assert!(verify_webhook_signature(
            SECRET,
            &header,
            payload,
            1_700_000_000
        ));
    }

    #[test]
    fn test_skewed_but_tolerated_timestamp() {
        let payload = b"{}";
        let header = sign(1_700_000_000, payload);
        assert!(verify_webhook_signature(
            SECRET,
            &header,
            payload,
            1_700_000_000 + SIGNATURE_TOLERANCE_SECS
        ));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = b"{}";
        let header = sign(1_700_000_000, payload);
        assert!(!verify_webhook_signature(
            SECRET,
            &header,
            payload,
            1_700_000_000 + SIGNATURE_TOLERANCE_SECS + 1
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign(1_700_000_000, b"{}");
        assert!(!verify_webhook_signature(
            SECRET,
            &header,
            b"{\"tampered\":true}",
            1_700_000_000
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = b"{}";
        let header = sign(1_700_000_000, payload);
        assert!(!verify_webhook_signature(
            "whsec_other",
            &header,
            payload,
            1_700_000_000
        ));
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(!verify_webhook_signature(SECRET, "", b"{}", 0));
        assert!(!verify_webhook_signature(SECRET, "t=abc,v1=zz", b"{}", 0));
        assert!(!verify_webhook_signature(SECRET, "v1=00ff", b"{}", 0));
    }
}
