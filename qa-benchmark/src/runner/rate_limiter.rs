//! Request pacing: minimum spacing plus a sliding requests-per-minute window

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Spaces consecutive requests and caps them per minute
pub struct RateLimiter {
    requests_per_minute: u32,
    min_interval: Duration,
    last_requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// `requests_per_minute == 0` disables the window cap
    pub fn new(requests_per_minute: u32, min_interval: Duration) -> Self {
        Self {
            requests_per_minute,
            min_interval,
            last_requests: Mutex::new(VecDeque::new()),
        }
    }

    /// No spacing and no cap
    pub fn unlimited() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Wait until a request may be sent, then record it
    pub async fn acquire(&self) {
        loop {
            if let Some(wait) = self.check_request_limit().await {
                tracing::debug!("Pacing request for {}ms", wait.as_millis());
                tokio::time::sleep(wait).await;
                continue;
            }

            let mut last = self.last_requests.lock().await;
            last.push_back(Instant::now());
            return;
        }
    }

    /// Returns the wait time if a request cannot be sent yet
    async fn check_request_limit(&self) -> Option<Duration> {
        let mut last = self.last_requests.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(60);

        while let Some(&front) = last.front() {
            if now.duration_since(front) > window {
                last.pop_front();
            } else {
                break;
            }
        }

        if let Some(&newest) = last.back() {
            let since = now.duration_since(newest);
            if since < self.min_interval {
                return Some(self.min_interval - since);
            }
        }

        if self.requests_per_minute > 0 && last.len() >= self.requests_per_minute as usize {
            if let Some(&oldest) = last.front() {
                let elapsed = now.duration_since(oldest);
                if elapsed < window {
                    return Some(window - elapsed + Duration::from_millis(10));
                }
            }
        }

        None
    }

    /// Requests recorded in the last minute
    pub async fn recent_requests(&self) -> usize {
        self.last_requests.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_basic() {
        let limiter = RateLimiter::new(5, Duration::ZERO);

        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.recent_requests().await, 5);
    }

    #[tokio::test]
    async fn test_min_interval_spaces_requests() {
        let limiter = RateLimiter::new(0, Duration::from_millis(30));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_unlimited_does_not_wait() {
        let limiter = RateLimiter::unlimited();
        let start = Instant::now();
        for _ in 0..100 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
