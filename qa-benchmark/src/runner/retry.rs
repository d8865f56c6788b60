//! Retry policy for generator calls

use std::time::Duration;

use crate::config::{BackoffKind, RetryConfig};
use crate::providers::ProviderError;

/// Delay schedule between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `(attempt + 1) * step`
    Linear { step: Duration },
    /// `initial * 2^attempt`, never above `max`
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay after the failed attempt with zero-based index `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(d) => *d,
            Backoff::Linear { step } => step.saturating_mul(attempt.saturating_add(1)),
            Backoff::Exponential { initial, max } => {
                let factor = 1u32 << attempt.min(16);
                initial.saturating_mul(factor).min(*max)
            }
        }
    }
}

/// Which failures are worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    RateLimitOnly,
    AnyError,
}

/// How many times to try a request and how long to wait in between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub retry_on: RetryOn,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Linear {
                step: Duration::from_secs(30),
            },
            retry_on: RetryOn::RateLimitOnly,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Fixed(Duration::ZERO),
            retry_on: RetryOn::RateLimitOnly,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        let delay = Duration::from_millis(config.delay_ms);
        let backoff = match config.backoff {
            BackoffKind::Fixed => Backoff::Fixed(delay),
            BackoffKind::Linear => Backoff::Linear { step: delay },
            BackoffKind::Exponential => Backoff::Exponential {
                initial: delay,
                max: Duration::from_millis(config.max_delay_ms),
            },
        };

        Self {
            max_attempts: config.max_attempts.max(1),
            backoff,
            retry_on: if config.retry_all_errors {
                RetryOn::AnyError
            } else {
                RetryOn::RateLimitOnly
            },
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn is_retryable(&self, err: &ProviderError) -> bool {
        match self.retry_on {
            RetryOn::RateLimitOnly => err.is_rate_limit(),
            // configuration problems never clear up by waiting
            RetryOn::AnyError => !matches!(err, ProviderError::Config(_)),
        }
    }

    /// Whether to try again after `err` ended zero-based attempt `attempt`
    pub fn should_retry(&self, err: &ProviderError, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts && self.is_retryable(err)
    }

    /// Wait before the next attempt; a server-provided retry-after wins when longer
    pub fn delay_for(&self, err: &ProviderError, attempt: u32) -> Duration {
        let delay = self.backoff.delay(attempt);
        match err {
            ProviderError::RateLimited { retry_after_ms } => delay.max(Duration::from_millis(*retry_after_ms)),
            _ => delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff_matches_quota_wait() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff.delay(0), Duration::from_secs(30));
        assert_eq!(policy.backoff.delay(1), Duration::from_secs(60));
        assert_eq!(policy.backoff.delay(2), Duration::from_secs(90));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(500),
        };
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(3), Duration::from_millis(500));
        assert_eq!(backoff.delay(40), Duration::from_millis(500));
    }

    #[test]
    fn test_only_rate_limits_retried_by_default() {
        let policy = RetryPolicy::default();
        let limited = ProviderError::RateLimited { retry_after_ms: 0 };
        let failed = ProviderError::Api { status: 500, message: "boom".into() };

        assert!(policy.should_retry(&limited, 0));
        assert!(policy.should_retry(&limited, 1));
        assert!(!policy.should_retry(&limited, 2));
        assert!(!policy.should_retry(&failed, 0));
    }

    #[test]
    fn test_any_error_skips_config_errors() {
        let config = RetryConfig {
            retry_all_errors: true,
            ..RetryConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert!(policy.should_retry(&ProviderError::Timeout { timeout_ms: 1 }, 0));
        assert!(!policy.should_retry(&ProviderError::Config("no key".into()), 0));
    }

    #[test]
    fn test_retry_after_wins_when_longer() {
        let policy = RetryPolicy::default().with_backoff(Backoff::Fixed(Duration::from_secs(1)));
        let err = ProviderError::RateLimited { retry_after_ms: 5_000 };
        assert_eq!(policy.delay_for(&err, 0), Duration::from_secs(5));
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from_config(&RetryConfig::default());
        assert_eq!(policy, RetryPolicy::default());
    }
}
