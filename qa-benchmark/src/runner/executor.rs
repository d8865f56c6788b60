//! Sequential request executor with pacing, timeouts and retries

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::rate_limiter::RateLimiter;
use super::retry::RetryPolicy;
use crate::config::Config;
use crate::providers::{ProviderError, ProviderResult, TextGenerator};

/// Configuration for the executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Minimum gap between two requests in milliseconds
    pub pacing_ms: u64,
    /// Requests per minute; 0 for no cap
    pub rpm: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            pacing_ms: 2000,
            rpm: 0,
        }
    }
}

/// Runs prompts against one generator, one at a time
pub struct Executor {
    config: ExecutorConfig,
    generator: Arc<dyn TextGenerator>,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

impl Executor {
    pub fn new(generator: Arc<dyn TextGenerator>, config: ExecutorConfig, retry: RetryPolicy) -> Self {
        let limiter = RateLimiter::new(config.rpm, Duration::from_millis(config.pacing_ms));
        Self {
            config,
            generator,
            retry,
            limiter,
        }
    }

    /// Executor for `generator` using the pipeline and retry sections of `config`
    /// and the request cap of the provider configured under `provider`
    pub fn from_config(generator: Arc<dyn TextGenerator>, config: &Config, provider: &str) -> Self {
        let rpm = config.get_provider(provider).map(|pc| pc.rpm).unwrap_or(0);
        let executor_config = ExecutorConfig {
            timeout_ms: config.pipeline.timeout_ms,
            pacing_ms: config.pipeline.pacing_ms,
            rpm,
        };
        Self::new(generator, executor_config, RetryPolicy::from_config(&config.retry))
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Generate text for `prompt`, retrying per the policy.
    ///
    /// Returns the last error once the policy gives up.
    pub async fn generate(&self, prompt: &str) -> ProviderResult<String> {
        let mut attempt = 0u32;

        loop {
            self.limiter.acquire().await;

            let err = match self.try_generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => e,
            };

            if !self.retry.should_retry(&err, attempt) {
                tracing::error!(
                    "Request to {} failed after {} attempt(s): {}",
                    self.generator.name(),
                    attempt + 1,
                    err
                );
                return Err(err);
            }

            let delay = self.retry.delay_for(&err, attempt);
            tracing::warn!(
                "Attempt {}/{} on {} failed ({}), waiting {}ms",
                attempt + 1,
                self.retry.max_attempts,
                self.generator.name(),
                err,
                delay.as_millis()
            );
            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Run prompts strictly in order
    pub async fn generate_all(&self, prompts: &[String]) -> Vec<ProviderResult<String>> {
        let mut results = Vec::with_capacity(prompts.len());
        for (i, prompt) in prompts.iter().enumerate() {
            tracing::info!("Request {}/{} on {}", i + 1, prompts.len(), self.generator.name());
            results.push(self.generate(prompt).await);
        }
        results
    }

    /// Single attempt
    async fn try_generate(&self, prompt: &str) -> ProviderResult<String> {
        let timeout = Duration::from_millis(self.config.timeout_ms);

        match tokio::time::timeout(timeout, self.generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }),
        }
    }
}
