//! OpenAI-compatible chat completion adapter.
//!
//! Implements the core [`LlmClient`] seam: JSON-mode completions with a
//! request timeout and a per-company hourly quota. Callers treat every error
//! as a fallback signal, so nothing here surfaces to API consumers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;
use serde_json::{Value, json};
use tracing::{debug, warn};

use projextpal_core::llm::{LlmClient, LlmError};
use projextpal_shared::config::LlmConfig;

/// Chat-completions client with per-company quota enforcement.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
    /// Completions consumed per company in the current hour window.
    quota: Cache<i64, Arc<AtomicU32>>,
    quota_per_hour: u32,
}

impl OpenAiClient {
    /// Builds a client from configuration. Returns `None` when no API key is
    /// configured; the caller should fall back to
    /// [`projextpal_core::llm::DisabledLlm`].
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .ok()?;

        Some(Self {
            http,
            api_key,
            model: config.model.clone(),
            api_base: config.api_base.clone(),
            quota: Cache::builder()
                .time_to_live(Duration::from_secs(3600))
                .max_capacity(10_000)
                .build(),
            quota_per_hour: config.company_quota_per_hour,
        })
    }

    /// Consumes one quota unit for the company, or reports exhaustion.
    fn take_quota(&self, company_id: i64) -> Result<(), LlmError> {
        let counter = self
            .quota
            .get_with(company_id, || Arc::new(AtomicU32::new(0)));
        let used = counter.fetch_add(1, Ordering::Relaxed);
        if used >= self.quota_per_hour {
            warn!(company_id, used, "LLM quota exhausted");
            return Err(LlmError::QuotaExhausted(company_id));
        }
        Ok(())
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete_json(
        &self,
        company_id: i64,
        system: &str,
        user: &str,
    ) -> Result<Value, LlmError> {
        self.take_quota(company_id)?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "response_format": { "type": "json_object" },
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Http(format!("provider returned {status}")));
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| LlmError::BadResponse(e.to_string()))?;

        let content = envelope
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::BadResponse("missing message content".into()))?;

        debug!(company_id, bytes = content.len(), "LLM completion received");

        let parsed: Value = serde_json::from_str(content)
            .map_err(|e| LlmError::BadResponse(format!("content is not JSON: {e}")))?;
        if !parsed.is_object() {
            return Err(LlmError::BadResponse("content is not a JSON object".into()));
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_quota(quota: u32) -> OpenAiClient {
        OpenAiClient::from_config(&LlmConfig {
            api_key: Some("sk-test".to_string()),
            model: "gpt-4o-mini".to_string(),
            api_base: "http://localhost:1".to_string(),
            timeout_secs: 1,
            company_quota_per_hour: quota,
        })
        .expect("key is set")
    }

    #[test]
    fn test_no_key_disables_client() {
        assert!(OpenAiClient::from_config(&LlmConfig::default()).is_none());
    }

    #[test]
    fn test_quota_counts_per_company() {
        let client = client_with_quota(2);

        assert!(client.take_quota(1).is_ok());
        assert!(client.take_quota(1).is_ok());
        assert!(matches!(
            client.take_quota(1),
            Err(LlmError::QuotaExhausted(1))
        ));

        // A different company has its own window.
        assert!(client.take_quota(2).is_ok());
    }
}
