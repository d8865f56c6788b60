//! Text-generation trait shared by every provider

use async_trait::async_trait;

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Quota and rate-limit rejections; the only failures retried by default
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Sampling settings sent with every request
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: u32,
}

impl GenerationSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_output_tokens: 2048,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }
}

/// Anything that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name (e.g., "gemini", "openai")
    fn name(&self) -> &str;

    /// Model used for requests
    fn model(&self) -> &str;

    /// Single completion for a single user prompt
    async fn generate(&self, prompt: &str) -> ProviderResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        assert!(ProviderError::RateLimited { retry_after_ms: 10 }.is_rate_limit());
        assert!(!ProviderError::Timeout { timeout_ms: 10 }.is_rate_limit());
        assert!(!ProviderError::Api { status: 500, message: "boom".into() }.is_rate_limit());
    }
}
