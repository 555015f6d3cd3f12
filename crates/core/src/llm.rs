//! LLM client abstraction.
//!
//! The core never talks to a model provider directly; boundary adapters
//! implement [`LlmClient`] and the analytics/forecast callers treat every
//! failure as a signal to fall back to deterministic computation.

use async_trait::async_trait;
use thiserror::Error;

/// Errors an LLM adapter can report. All of them route callers to the
/// deterministic fallback path; none of them reach the API caller.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured; LLM paths are disabled.
    #[error("LLM disabled: no API key configured")]
    Disabled,

    /// The per-company quota window is exhausted.
    #[error("LLM quota exhausted for company {0}")]
    QuotaExhausted(i64),

    /// The request timed out.
    #[error("LLM request timed out")]
    Timeout,

    /// Transport or provider error.
    #[error("LLM request failed: {0}")]
    Http(String),

    /// The model returned something that is not the requested JSON shape.
    #[error("LLM returned malformed response: {0}")]
    BadResponse(String),
}

/// A JSON-mode completion client with a timeout.
///
/// `complete_json` sends a system + user prompt pair, requests a JSON object
/// response, and returns the parsed value. Implementations enforce the
/// per-company rate limit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Requests a JSON-mode completion on behalf of `company_id`.
    async fn complete_json(
        &self,
        company_id: i64,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value, LlmError>;
}

/// An always-disabled client for tests and LLM-less deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLlm;

#[async_trait]
impl LlmClient for DisabledLlm {
    async fn complete_json(
        &self,
        _company_id: i64,
        _system: &str,
        _user: &str,
    ) -> Result<serde_json::Value, LlmError> {
        Err(LlmError::Disabled)
    }
}
