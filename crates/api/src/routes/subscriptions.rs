//! Subscription lifecycle routes and the provider webhook.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{
    AppState,
    clients::billing::verify_webhook_signature,
    error::{ApiError, db_err},
    middleware::auth::TenantContext,
};
use projextpal_core::billing::{BillingEvent, events};
use projextpal_core::policy::{Action, check_action};
use projextpal_db::{SubscriptionRepository, UserRepository};
use projextpal_shared::AppError;

/// Creates the authenticated subscription routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions/checkout", post(checkout))
        .route("/subscriptions/upgrade", post(upgrade))
        .route("/subscriptions/cancel", post(cancel))
}

/// Creates the public webhook route. Signature-verified, not bearer-authed.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/subscriptions/webhooks/stripe", post(webhook))
}

/// Checkout payload.
#[derive(Debug, Deserialize)]
struct CheckoutPayload {
    /// Requested price; must be on the configured allow-list.
    price_id: String,
    /// Redirect target after successful payment.
    success_url: String,
    /// Redirect target after abandonment.
    cancel_url: String,
}

/// Upgrade payload.
#[derive(Debug, Deserialize)]
struct UpgradePayload {
    /// New price; must be on the configured allow-list.
    price_id: String,
}

/// Cancel query.
#[derive(Debug, Deserialize)]
struct CancelQuery {
    /// Cancel at the period boundary (default) or immediately.
    at_period_end: Option<bool>,
}

/// Rejects prices the server does not sell.
fn check_price_allowed(state: &AppState, price_id: &str) -> Result<(), ApiError> {
    if state
        .config
        .billing
        .price_ids
        .iter()
        .any(|p| p == price_id)
    {
        Ok(())
    } else {
        Err(AppError::Validation(format!("unknown price: {price_id}")).into())
    }
}

/// Tenant-scoped callers only; superadmins have no company to bill.
fn require_company(ctx: &projextpal_core::policy::Context) -> Result<i64, ApiError> {
    ctx.company_id
        .ok_or_else(|| AppError::Validation("caller has no billable company".into()).into())
}

/// POST /subscriptions/checkout - Admin-only checkout session creation.
async fn checkout(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, ApiError> {
    check_action(&ctx, Action::ManageSubscription).map_err(AppError::from)?;
    check_price_allowed(&state, &payload.price_id)?;
    let company_id = require_company(&ctx)?;

    let subs = SubscriptionRepository::new((*state.db).clone());
    if subs
        .active_for_company(company_id)
        .await
        .map_err(db_err)?
        .is_some()
    {
        return Err(AppError::Conflict(
            "company already has an active subscription".into(),
        )
        .into());
    }

    let user = UserRepository::new((*state.db).clone())
        .find_by_id(ctx.user_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound("caller".into()))?;

    let session = state
        .billing
        .create_checkout_session(
            &user.email,
            &payload.price_id,
            &payload.success_url,
            &payload.cancel_url,
        )
        .await?;

    if let Some(subscription_id) = &session.subscription {
        subs.record_checkout(
            company_id,
            subscription_id,
            session.customer.as_deref(),
            &payload.price_id,
        )
        .await
        .map_err(db_err)?;
    }

    info!(company_id, session_id = %session.id, "checkout session created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "session_id": session.id,
            "checkout_url": session.url,
        })),
    ))
}

/// POST /subscriptions/upgrade - Swap the active subscription onto a new
/// price, with prorations. The price is server-verified; the provider's item
/// id is fetched rather than trusted from the caller.
async fn upgrade(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Json(payload): Json<UpgradePayload>,
) -> Result<Json<Value>, ApiError> {
    check_action(&ctx, Action::ManageSubscription).map_err(AppError::from)?;
    check_price_allowed(&state, &payload.price_id)?;
    let company_id = require_company(&ctx)?;

    let subs = SubscriptionRepository::new((*state.db).clone());
    let current = subs
        .active_for_company(company_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound("no active subscription".into()))?;
    let external_id = current
        .external_subscription_id
        .ok_or_else(|| AppError::Conflict("subscription has no provider id yet".into()))?;

    let remote = state.billing.fetch_subscription(&external_id).await?;
    let item_id = remote
        .pointer("/items/data/0/id")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::UpstreamUnavailable("provider subscription has no items".into())
        })?;

    let updated = state
        .billing
        .update_subscription_price(&external_id, item_id, &payload.price_id)
        .await?;

    info!(company_id, %external_id, price = %payload.price_id, "subscription upgraded");

    Ok(Json(updated))
}

/// POST /subscriptions/cancel?at_period_end= - Cancel the active
/// subscription; state converges via the deletion webhook.
async fn cancel(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Query(query): Query<CancelQuery>,
) -> Result<Json<Value>, ApiError> {
    check_action(&ctx, Action::ManageSubscription).map_err(AppError::from)?;
    let company_id = require_company(&ctx)?;

    let subs = SubscriptionRepository::new((*state.db).clone());
    let current = subs
        .active_for_company(company_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound("no active subscription".into()))?;
    let external_id = current
        .external_subscription_id
        .ok_or_else(|| AppError::Conflict("subscription has no provider id yet".into()))?;

    let at_period_end = query.at_period_end.unwrap_or(true);
    let result = state
        .billing
        .cancel_subscription(&external_id, at_period_end)
        .await?;

    info!(company_id, %external_id, at_period_end, "subscription cancellation requested");

    Ok(Json(result))
}

/// POST /subscriptions/webhooks/stripe - Applies provider events.
///
/// 400 only on a bad signature or malformed JSON. Unknown event kinds and
/// re-deliveries are acknowledged with 200 so the provider stops retrying.
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Validation("missing signature header".into()))?;

    if !verify_webhook_signature(
        &state.config.billing.webhook_secret,
        signature,
        &body,
        Utc::now().timestamp(),
    ) {
        return Err(AppError::Validation("invalid webhook signature".into()).into());
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("malformed webhook payload: {e}")))?;

    let event = events::parse(&payload)
        .map_err(|e| AppError::Validation(format!("malformed webhook event: {e}")))?;

    if let BillingEvent::Ignored(kind) = &event.event {
        info!(kind = %kind, "ignoring unhandled webhook event");
        return Ok(Json(json!({ "received": true })));
    }

    let subs = SubscriptionRepository::new((*state.db).clone());

    // Resolve the tenant through the provider subscription id recorded at
    // checkout. Events for unknown subscriptions are acknowledged and
    // dropped; retrying them cannot succeed.
    let Some(external_id) = event.external_subscription_id.clone() else {
        warn!("webhook event carries no subscription id");
        return Ok(Json(json!({ "received": true })));
    };

    let Some(known) = subs.find_by_external_id(&external_id).await.map_err(db_err)? else {
        warn!(%external_id, "webhook for unknown subscription");
        return Ok(Json(json!({ "received": true })));
    };

    subs.apply_event(known.company_id, Some(&external_id), &event.event)
        .await
        .map_err(db_err)?;

    Ok(Json(json!({ "received": true })))
}
