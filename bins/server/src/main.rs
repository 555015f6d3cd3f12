//! ProjeXtPal API Server
//!
//! Main entry point for the ProjeXtPal backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use projextpal_api::{AppState, clients::billing::BillingClient, clients::llm::OpenAiClient,
    create_router};
use projextpal_core::llm::{DisabledLlm, LlmClient};
use projextpal_core::storage::{StorageConfig, StorageProvider, StorageService};
use projextpal_db::connect;
use projextpal_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "projextpal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let jwt = JwtService::new(jwt_config);

    // LLM adapter; absent API key disables it and everything falls back to
    // deterministic computation.
    let llm: Arc<dyn LlmClient> = match OpenAiClient::from_config(&config.llm) {
        Some(client) => {
            info!(model = %config.llm.model, "LLM client configured");
            Arc::new(client)
        }
        None => {
            info!("No LLM API key configured; running with deterministic fallbacks only");
            Arc::new(DisabledLlm)
        }
    };

    // Billing provider client
    let billing = BillingClient::new(&config.billing);

    // Optional document storage
    let storage = build_storage().map(Arc::new);
    match &storage {
        Some(s) => info!(provider = s.provider_name(), "Document storage configured"),
        None => info!("Document storage not configured; upload routes disabled"),
    }

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt: Arc::new(jwt),
        llm,
        billing: Arc::new(billing),
        storage,
        config: Arc::new(config.clone()),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the storage service from `STORAGE_*` environment variables.
/// Returns `None` when no provider is configured.
fn build_storage() -> Option<StorageService> {
    let provider = match std::env::var("STORAGE_PROVIDER").ok()?.as_str() {
        "s3" => StorageProvider::s3(
            std::env::var("S3_ENDPOINT").ok()?,
            std::env::var("S3_BUCKET").ok()?,
            std::env::var("S3_ACCESS_KEY_ID").ok()?,
            std::env::var("S3_SECRET_ACCESS_KEY").ok()?,
            std::env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string()),
        ),
        "fs" => StorageProvider::local_fs(
            std::env::var("STORAGE_FS_ROOT").unwrap_or_else(|_| "./data/documents".to_string()),
        ),
        other => {
            tracing::warn!(provider = other, "Unknown storage provider; storage disabled");
            return None;
        }
    };

    match StorageService::from_config(StorageConfig::new(provider)) {
        Ok(service) => Some(service),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to initialize storage; storage disabled");
            None
        }
    }
}
