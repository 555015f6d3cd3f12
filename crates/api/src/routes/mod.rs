//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod documents;
pub mod financials;
pub mod health;
pub mod projects;
pub mod subscriptions;
pub mod tasks;
pub mod team;
pub mod time_entries;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(projects::routes())
        .merge(tasks::routes())
        .merge(team::routes())
        .merge(time_entries::routes())
        .merge(financials::routes())
        .merge(subscriptions::routes())
        .merge(documents::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes: health, auth, and the provider webhook (it carries its
    // own signature check instead of a bearer token).
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(subscriptions::webhook_routes())
        .merge(protected_routes)
}
