//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// External billing (Stripe-compatible) configuration.
    pub billing: BillingConfig,
    /// LLM configuration.
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// External billing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// API secret key.
    pub secret_key: String,
    /// Webhook signing secret shared with the provider.
    pub webhook_secret: String,
    /// Allow-listed price identifiers; checkout and upgrades reject anything
    /// not on this list.
    #[serde(default)]
    pub price_ids: Vec<String>,
    /// Billing API base URL.
    #[serde(default = "default_billing_api_base")]
    pub api_base: String,
}

fn default_billing_api_base() -> String {
    "https://api.stripe.com/v1".to_string()
}

/// LLM configuration. Absent API key disables LLM paths; callers fall back
/// to deterministic computation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfig {
    /// API key. `None` disables the LLM entirely.
    pub api_key: Option<String>,
    /// Model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// API base URL.
    #[serde(default = "default_llm_api_base")]
    pub api_base: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    /// Per-company completions allowed per hour.
    #[serde(default = "default_company_quota")]
    pub company_quota_per_hour: u32,
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_company_quota() -> u32 {
    30
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PROJEXTPAL").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
