use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use weft_core::{WeftError, WeftResult};

/// Configuration for an OpenAI-compatible chat completion endpoint.
///
/// Validated at construction: a missing API key or model is a fatal
/// configuration error, raised immediately and never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier sent in each request.
    pub model: String,
    /// Base URL of the provider, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token for the provider.
    pub api_key: String,
    /// Completion token cap per request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature; omitted from the request when `None`.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Upper bound on continue-after-truncation rounds per generation.
    #[serde(default = "default_max_continuations")]
    pub max_continuations: u32,
    /// Retry/backoff policy for transient provider errors.
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_continuations() -> u32 {
    3
}

impl LlmConfig {
    /// Creates a validated config with default generation limits.
    pub fn new(
        model: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> WeftResult<Self> {
        let model = model.into();
        let base_url = base_url.into();
        let api_key = api_key.into();
        if model.trim().is_empty() {
            return Err(WeftError::Config("model must not be empty".into()));
        }
        if base_url.trim().is_empty() {
            return Err(WeftError::Config("base_url must not be empty".into()));
        }
        if api_key.trim().is_empty() {
            return Err(WeftError::Config("api_key must not be empty".into()));
        }
        Ok(Self {
            model,
            base_url,
            api_key,
            max_tokens: default_max_tokens(),
            temperature: None,
            max_continuations: default_max_continuations(),
            retry: RetryPolicy::default(),
        })
    }

    /// Sets the completion token cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The chat completions endpoint URL.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
