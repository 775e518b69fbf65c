//! Token bucket admission limiter.
//!
//! A background replenishment task adds one token per interval into a pool
//! bounded by the bucket capacity; an addition to a full pool is dropped, so
//! the producer never blocks. Tokens accumulate while the limiter is idle,
//! allowing bursts up to the capacity, unlike the leaky bucket's strictly
//! uniform cadence.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::time::MissedTickBehavior;

use crate::decision::{Decision, DenyReason};
use crate::error::Result;
use crate::limiter::{deadline_elapsed, Limiter, ShutdownBehavior};

/// Token bucket admission limiter.
///
/// Admission consumes one token; `acquire` suspends until a token, the
/// caller's deadline, or shutdown. Available tokens stay within
/// `[0, capacity]` at all times: the pool is written by exactly one
/// replenishment task and drained by concurrent consumers, so the
/// check-then-add in the producer cannot overshoot.
///
/// Must be created inside a Tokio runtime: construction spawns the
/// replenishment task. Dropping the limiter stops the task.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    tokens: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
    behavior: ShutdownBehavior,
    capacity: usize,
}

impl TokenBucketLimiter {
    /// Create a new token bucket limiter holding at most `capacity` tokens,
    /// replenished one per `interval`, failing closed on shutdown.
    ///
    /// The bucket starts empty; the first token is produced by the initial
    /// replenishment tick.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero or `capacity` is zero.
    pub fn new(capacity: usize, interval: Duration) -> Self {
        Self::with_shutdown_behavior(capacity, interval, ShutdownBehavior::default())
    }

    /// Create a new token bucket limiter with an explicit shutdown behavior.
    pub fn with_shutdown_behavior(
        capacity: usize,
        interval: Duration,
        behavior: ShutdownBehavior,
    ) -> Self {
        assert!(!interval.is_zero(), "interval must be non-zero");
        assert!(capacity > 0, "capacity must be non-zero");

        let tokens = Arc::new(Semaphore::new(0));
        let (shutdown, mut stopped) = watch::channel(false);

        let pool = Arc::clone(&tokens);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Drop the addition when the pool is full. Only this
                        // task adds permits, so the check cannot race another
                        // producer past the capacity.
                        if pool.available_permits() < capacity {
                            pool.add_permits(1);
                        }
                    }
                    _ = stopped.changed() => break,
                }
            }
        });

        Self {
            tokens,
            shutdown,
            behavior,
            capacity,
        }
    }

    /// Stop the replenishment task. Idempotent: later calls are no-ops.
    pub fn shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            tracing::debug!(limiter = "token_bucket", "limiter shut down");
        }
    }

    /// Number of tokens currently available.
    pub fn available(&self) -> usize {
        self.tokens.available_permits()
    }

    /// The bucket capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Limiter for TokenBucketLimiter {
    fn name(&self) -> &'static str {
        "token_bucket"
    }

    async fn acquire(&self, deadline: Option<Duration>) -> Result<Decision> {
        let mut stopped = self.shutdown.subscribe();
        if *stopped.borrow() {
            return Ok(self.behavior.decision());
        }

        tokio::select! {
            _ = deadline_elapsed(deadline) => Ok(Decision::Deny(DenyReason::Cancelled)),
            _ = stopped.wait_for(|s| *s) => Ok(self.behavior.decision()),
            permit = self.tokens.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    Ok(Decision::Allow)
                }
                Err(_) => Ok(self.behavior.decision()),
            },
        }
    }
}
