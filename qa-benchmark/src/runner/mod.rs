//! Request execution: pacing, retries and timeouts

pub mod executor;
pub mod rate_limiter;
pub mod retry;

pub use executor::{Executor, ExecutorConfig};
pub use rate_limiter::RateLimiter;
pub use retry::{Backoff, RetryOn, RetryPolicy};
