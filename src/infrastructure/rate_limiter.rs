//! Rate Limiter
//!
//! Minimum-interval throttle for outbound calls to rate-limited providers.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Delay paid before every call, and minimum spacing between calls
    pub min_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
        }
    }
}

/// Shared throttle for one upstream service.
///
/// Every caller waits at least `min_interval` before its call goes out, and
/// calls from all callers are released at least `min_interval` apart. One
/// instance is shared by every request that talks to the same service.
pub struct RateLimiter {
    config: RateLimitConfig,
    /// Release time handed to the most recent caller
    last_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            last_slot: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.config.min_interval
    }

    /// Reserve the next release slot without waiting.
    fn reserve(&self) -> Instant {
        let interval = self.config.min_interval;
        let earliest = Instant::now() + interval;

        let mut last = self.last_slot.lock();
        let slot = match *last {
            Some(prev) if prev + interval > earliest => prev + interval,
            _ => earliest,
        };
        *last = Some(slot);
        slot
    }

    /// Wait for this caller's turn.
    ///
    /// Returns how long the caller waited.
    pub async fn acquire(&self) -> Duration {
        let start = Instant::now();
        let slot = self.reserve();
        tokio::time::sleep_until(slot).await;
        let waited = start.elapsed();
        tracing::trace!("rate limiter released after {:?}", waited);
        waited
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_config_default() {
        let config = RateLimitConfig::default();
        assert_eq!(config.min_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_rate_limiter_default() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.min_interval(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_call_waits_full_interval() {
        let limiter = RateLimiter::default();
        let start = Instant::now();

        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_calls_each_wait() {
        let limiter = RateLimiter::default();
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_are_spaced() {
        let limiter = Arc::new(RateLimiter::default());
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut released = Vec::new();
        for handle in handles {
            released.push(handle.await.unwrap());
        }
        released.sort();

        assert!(released[0] - start >= Duration::from_secs(1));
        assert!(released[1] - released[0] >= Duration::from_secs(1));
        assert!(released[2] - released[1] >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_gap_does_not_accumulate_credit() {
        let limiter = RateLimiter::default();

        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        let waited = limiter.acquire().await;
        assert!(waited >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_interval() {
        let limiter = RateLimiter::new(RateLimitConfig {
            min_interval: Duration::from_millis(250),
        });

        let waited = limiter.acquire().await;
        assert!(waited >= Duration::from_millis(250));
        assert!(waited < Duration::from_secs(1));
    }
}
