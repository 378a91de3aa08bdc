//! Request pacing for the suggestion service.
//!
//! One permit per interval, first permit immediately. Waiting callers are
//! delayed, never rejected; the only failure is cancellation.

use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default spacing between suggestion requests
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimiterError {
    #[error("Rate limiter wait cancelled")]
    Cancelled,
}

/// Fixed-interval rate limiter
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next permit, or bail out once `cancel` fires
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), LimiterError> {
        if cancel.is_cancelled() {
            return Err(LimiterError::Cancelled);
        }

        let wait_time = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = (*next).max(now);
            *next = slot + self.interval;
            slot - now
        };

        if wait_time.is_zero() {
            return Ok(());
        }

        tracing::debug!(wait_ms = wait_time.as_millis() as u64, "Waiting for rate limiter");

        tokio::select! {
            _ = cancel.cancelled() => Err(LimiterError::Cancelled),
            _ = tokio::time::sleep(wait_time) => Ok(()),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_permit_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permits_are_spaced_by_interval() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        limiter.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
        limiter.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_limiter_refills() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        let cancel = CancellationToken::new();

        limiter.acquire(&cancel).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        let cancel = CancellationToken::new();
        limiter.acquire(&cancel).await.unwrap();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        assert_eq!(limiter.acquire(&cancel).await, Err(LimiterError::Cancelled));
        assert_eq!(limiter.acquire(&cancel).await, Err(LimiterError::Cancelled));
    }
}
