//! Sliding-window rate limiter for REST requests.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Sliding window rate limiter.
///
/// Tracks request timestamps over a trailing window. A caller that finds
/// the window full waits for the oldest request to age out instead of
/// failing.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum requests per window.
    max_requests: u32,
    /// Window duration.
    window: Duration,
    /// Request timestamps, oldest first.
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a new rate limiter.
    ///
    /// # Arguments
    ///
    /// * `max_requests` - Maximum requests allowed in the window
    /// * `window` - Duration of the sliding window
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(max_requests as usize)),
        }
    }

    /// Creates a rate limiter for requests per minute.
    #[must_use]
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Checks if a request can be made immediately.
    #[must_use]
    pub fn can_proceed(&self) -> bool {
        self.wait_time().is_zero()
    }

    /// Returns the time to wait before the next request can be made.
    #[must_use]
    pub fn wait_time(&self) -> Duration {
        let mut timestamps = self.timestamps.lock();
        let now = Instant::now();
        Self::evict(&mut timestamps, now, self.window);

        if timestamps.len() < self.max_requests as usize {
            return Duration::ZERO;
        }
        timestamps.front().map_or(Duration::ZERO, |&oldest| {
            self.window.saturating_sub(now.duration_since(oldest))
        })
    }

    /// Records a request if the window has room.
    pub fn try_acquire(&self) -> bool {
        let mut timestamps = self.timestamps.lock();
        let now = Instant::now();
        Self::evict(&mut timestamps, now, self.window);

        if timestamps.len() >= self.max_requests as usize {
            return false;
        }
        timestamps.push_back(now);
        true
    }

    /// Waits until a request can be made, then records it.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            let wait = self.wait_time();
            debug!(
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "Rate limit reached, waiting"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Resets the rate limiter state.
    pub fn reset(&self) {
        self.timestamps.lock().clear();
    }

    /// Returns the current number of requests in the window.
    #[must_use]
    pub fn current_count(&self) -> usize {
        let mut timestamps = self.timestamps.lock();
        Self::evict(&mut timestamps, Instant::now(), self.window);
        timestamps.len()
    }

    /// Returns the maximum requests allowed.
    #[must_use]
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Returns the window duration.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    fn evict(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(&oldest) = timestamps.front() {
            if now.duration_since(oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_basic() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));

        assert!(limiter.can_proceed());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.can_proceed());
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.current_count(), 3);
    }

    #[test]
    fn test_rate_limiter_per_minute() {
        let limiter = RateLimiter::per_minute(60);
        assert_eq!(limiter.max_requests(), 60);
        assert_eq!(limiter.window(), Duration::from_secs(60));
    }

    #[test]
    fn test_rate_limiter_reset() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        limiter.try_acquire();
        limiter.try_acquire();
        assert_eq!(limiter.current_count(), 2);

        limiter.reset();
        assert_eq!(limiter.current_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(4)).await;
        limiter.acquire().await;

        assert_eq!(limiter.wait_time(), Duration::from_secs(6));
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(limiter.can_proceed());
        assert_eq!(limiter.current_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixty_first_request_waits() {
        let limiter = RateLimiter::per_minute(60);
        let start = Instant::now();

        for _ in 0..60 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert_eq!(limiter.current_count(), 1);
    }
}
