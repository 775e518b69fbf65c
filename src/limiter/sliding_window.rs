//! Sliding window admission limiter.
//!
//! Keeps a rolling log of admission timestamps, oldest first, and decides
//! against a freshly pruned view of the trailing interval. The whole
//! check-prune-append sequence runs under one lock, so the decision is always
//! consistent with the log it was made against.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::decision::{Decision, DenyReason};
use crate::error::Result;
use crate::limiter::Limiter;

/// Sliding window admission limiter.
///
/// Admits at most `rate` requests within any trailing `interval`. More
/// precise than the fixed window at the cost of one timestamp of memory per
/// retained admission.
///
/// An entry that sits exactly at `now - interval` is treated as outside the
/// window and pruned.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    /// Admission timestamps in arrival order. Entries are appended under the
    /// lock, so the log is non-decreasing and a prefix scan prunes it.
    log: Mutex<VecDeque<Instant>>,
    interval: Duration,
    rate: usize,
}

impl SlidingWindowLimiter {
    /// Create a new sliding window limiter admitting at most `rate` requests
    /// per trailing `interval`.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn new(interval: Duration, rate: usize) -> Self {
        assert!(!interval.is_zero(), "interval must be non-zero");

        Self {
            log: Mutex::new(VecDeque::with_capacity(rate)),
            interval,
            rate,
        }
    }

    /// Decide under the lock. The async trait method delegates here.
    pub fn check(&self) -> Decision {
        let now = Instant::now();
        let mut log = self.log.lock();

        // Fast path: room left without pruning.
        if log.len() < self.rate {
            log.push_back(now);
            return Decision::Allow;
        }

        // Slow path: drop everything at or before the window boundary. The
        // boundary can predate the process start early in the limiter's life,
        // in which case nothing is prunable yet.
        if let Some(boundary) = now.checked_sub(self.interval) {
            while let Some(&oldest) = log.front() {
                if oldest <= boundary {
                    log.pop_front();
                } else {
                    break;
                }
            }
        }

        if log.len() >= self.rate {
            return Decision::Deny(DenyReason::LimitExceeded);
        }

        log.push_back(now);
        Decision::Allow
    }

    /// Number of admissions currently retained in the log.
    pub fn retained(&self) -> usize {
        self.log.lock().len()
    }
}

impl Limiter for SlidingWindowLimiter {
    fn name(&self) -> &'static str {
        "sliding_window"
    }

    async fn acquire(&self, _deadline: Option<Duration>) -> Result<Decision> {
        Ok(self.check())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sliding_window_basic() {
        let limiter = SlidingWindowLimiter::new(Duration::from_millis(200), 5);

        for i in 1..=5 {
            let decision = limiter.acquire(None).await.unwrap();
            assert!(decision.is_allowed(), "Request {} should be allowed", i);
        }

        let decision = limiter.acquire(None).await.unwrap();
        assert_eq!(decision, Decision::Deny(DenyReason::LimitExceeded));
    }

    #[tokio::test]
    async fn test_sliding_window_prunes_after_interval() {
        let limiter = SlidingWindowLimiter::new(Duration::from_millis(100), 5);

        for _ in 0..5 {
            assert!(limiter.acquire(None).await.unwrap().is_allowed());
        }
        assert!(limiter.acquire(None).await.unwrap().is_denied());

        tokio::time::sleep(Duration::from_millis(150)).await;

        // All prior entries are now outside the trailing interval.
        assert!(limiter.acquire(None).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_sliding_window_partial_prune() {
        let limiter = SlidingWindowLimiter::new(Duration::from_millis(200), 2);

        assert!(limiter.acquire(None).await.unwrap().is_allowed());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(limiter.acquire(None).await.unwrap().is_allowed());

        // First entry still in the window.
        assert!(limiter.acquire(None).await.unwrap().is_denied());

        tokio::time::sleep(Duration::from_millis(100)).await;

        // First entry expired, second still retained.
        assert!(limiter.acquire(None).await.unwrap().is_allowed());
        assert_eq!(limiter.retained(), 2);
    }

    #[tokio::test]
    async fn test_sliding_window_retained_never_exceeds_rate() {
        let limiter = SlidingWindowLimiter::new(Duration::from_millis(100), 3);

        for _ in 0..10 {
            let _ = limiter.acquire(None).await.unwrap();
        }
        assert!(limiter.retained() <= 3);
    }
}
