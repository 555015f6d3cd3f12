//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware and the tenant context extractor
//! - Boundary clients for the LLM and billing providers
//! - Response types

pub mod clients;
pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use projextpal_core::llm::LlmClient;
use projextpal_core::storage::StorageService;
use projextpal_shared::{AppConfig, JwtService};

use clients::billing::BillingClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt: Arc<JwtService>,
    /// LLM completion client (disabled stub when no key is configured).
    pub llm: Arc<dyn LlmClient>,
    /// Billing provider client.
    pub billing: Arc<BillingClient>,
    /// Storage service for project documents (optional).
    pub storage: Option<Arc<StorageService>>,
    /// Loaded application configuration.
    pub config: Arc<AppConfig>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
