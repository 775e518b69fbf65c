//! Leaky bucket admission limiter.
//!
//! A pacing gate: a background task releases at most one admission slot per
//! interval, and `acquire` suspends until a slot, the caller's deadline, or
//! shutdown. No slots accumulate while the limiter is idle; at most one
//! unconsumed slot is buffered and further ticks are dropped, so admissions
//! are paced at no faster than one per interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::time::MissedTickBehavior;

use crate::decision::{Decision, DenyReason};
use crate::error::Result;
use crate::limiter::{deadline_elapsed, Limiter, ShutdownBehavior};

/// Leaky bucket admission limiter.
///
/// Must be created inside a Tokio runtime: construction spawns the pacing
/// task. Dropping the limiter stops the task; [`shutdown`](Self::shutdown)
/// stops it eagerly and resolves waiting callers per the configured
/// [`ShutdownBehavior`].
#[derive(Debug)]
pub struct LeakyBucketLimiter {
    slot: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
    behavior: ShutdownBehavior,
}

impl LeakyBucketLimiter {
    /// Create a new leaky bucket limiter releasing one admission per
    /// `interval`, failing closed on shutdown.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn new(interval: Duration) -> Self {
        Self::with_shutdown_behavior(interval, ShutdownBehavior::default())
    }

    /// Create a new leaky bucket limiter with an explicit shutdown behavior.
    pub fn with_shutdown_behavior(interval: Duration, behavior: ShutdownBehavior) -> Self {
        assert!(!interval.is_zero(), "interval must be non-zero");

        let slot = Arc::new(Semaphore::new(0));
        let (shutdown, mut stopped) = watch::channel(false);

        let pacer = Arc::clone(&slot);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // At most one unconsumed slot; extra ticks are dropped.
                        if pacer.available_permits() == 0 {
                            pacer.add_permits(1);
                        }
                    }
                    _ = stopped.changed() => break,
                }
            }
        });

        Self {
            slot,
            shutdown,
            behavior,
        }
    }

    /// Stop the pacing task. Idempotent: later calls are no-ops.
    ///
    /// Callers already suspended in [`Limiter::acquire`] resolve per the
    /// configured [`ShutdownBehavior`], as do all future calls.
    pub fn shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            tracing::debug!(limiter = "leaky_bucket", "limiter shut down");
        }
    }
}

impl Limiter for LeakyBucketLimiter {
    fn name(&self) -> &'static str {
        "leaky_bucket"
    }

    async fn acquire(&self, deadline: Option<Duration>) -> Result<Decision> {
        let mut stopped = self.shutdown.subscribe();
        if *stopped.borrow() {
            return Ok(self.behavior.decision());
        }

        tokio::select! {
            _ = deadline_elapsed(deadline) => Ok(Decision::Deny(DenyReason::Cancelled)),
            _ = stopped.wait_for(|s| *s) => Ok(self.behavior.decision()),
            permit = self.slot.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    Ok(Decision::Allow)
                }
                Err(_) => Ok(self.behavior.decision()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_leaky_bucket_paces_admissions() {
        let limiter = LeakyBucketLimiter::new(Duration::from_millis(200));

        // First slot arrives with the initial tick.
        let decision = limiter.acquire(None).await.unwrap();
        assert!(decision.is_allowed());

        // Immediately after an admission the next slot is an interval away,
        // so a deadline shorter than the interval must deny, never allow.
        let decision = limiter
            .acquire(Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert_eq!(decision, Decision::Deny(DenyReason::Cancelled));
    }

    #[tokio::test]
    async fn test_leaky_bucket_releases_next_slot() {
        let limiter = LeakyBucketLimiter::new(Duration::from_millis(50));

        assert!(limiter.acquire(None).await.unwrap().is_allowed());
        // Blocks until the next tick.
        assert!(limiter.acquire(None).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_leaky_bucket_shutdown_fail_closed() {
        let limiter = LeakyBucketLimiter::new(Duration::from_secs(60));
        limiter.shutdown();

        let decision = limiter.acquire(None).await.unwrap();
        assert_eq!(decision, Decision::Deny(DenyReason::ShutDown));
    }

    #[tokio::test]
    async fn test_leaky_bucket_shutdown_fail_open() {
        let limiter = LeakyBucketLimiter::with_shutdown_behavior(
            Duration::from_secs(60),
            ShutdownBehavior::FailOpen,
        );
        limiter.shutdown();

        assert!(limiter.acquire(None).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_leaky_bucket_shutdown_wakes_waiter() {
        let limiter = Arc::new(LeakyBucketLimiter::new(Duration::from_secs(60)));
        // Consume the initial slot.
        assert!(limiter.acquire(None).await.unwrap().is_allowed());

        let waiter = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire(None).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        limiter.shutdown();

        let decision = waiter.await.unwrap().unwrap();
        assert_eq!(decision, Decision::Deny(DenyReason::ShutDown));
    }

    #[tokio::test]
    async fn test_leaky_bucket_shutdown_idempotent() {
        let limiter = LeakyBucketLimiter::new(Duration::from_secs(60));
        limiter.shutdown();
        limiter.shutdown();

        assert!(limiter.acquire(None).await.unwrap().is_denied());
    }
}
