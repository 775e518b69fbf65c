//! Distributed sliding window admission limiter.
//!
//! The store keeps a sorted set of admission timestamps per key; the script
//! prunes entries older than the trailing interval, denies when the remaining
//! count has reached the rate, and otherwise records the current timestamp
//! and refreshes the key's expiry, all in one atomic execution.

use std::time::Duration;

use crate::decision::{Decision, DenyReason};
use crate::error::{ConfigError, Result};
use crate::limiter::Limiter;
use crate::store::{current_timestamp_ms, AtomicStore};

const SLIDING_WINDOW_SCRIPT: &str = include_str!("lua/sliding_window.lua");

/// Distributed sliding window admission limiter.
///
/// Same trailing-interval semantics as
/// [`SlidingWindowLimiter`](crate::SlidingWindowLimiter), correct across
/// processes. The caller supplies its current wall-clock timestamp, so the
/// processes sharing a key do not need synchronized clocks beyond ordinary
/// wall-clock accuracy.
///
/// A store failure fails open: the error is logged and the request admitted.
#[derive(Debug)]
pub struct DistributedSlidingWindowLimiter<S> {
    store: S,
    key: String,
    interval: Duration,
    rate: i64,
}

impl<S: AtomicStore> DistributedSlidingWindowLimiter<S> {
    /// Create a new distributed sliding window limiter admitting at most
    /// `rate` requests per trailing `interval` across all processes sharing
    /// `key`.
    ///
    /// # Panics
    ///
    /// Panics on a configuration [`try_new`](Self::try_new) would reject.
    pub fn new(store: S, key: impl Into<String>, interval: Duration, rate: i64) -> Self {
        match Self::try_new(store, key, interval, rate) {
            Ok(limiter) => limiter,
            Err(err) => panic!("invalid distributed sliding window configuration: {err}"),
        }
    }

    /// Try to create a new distributed sliding window limiter, returning an
    /// error if the configuration is invalid.
    ///
    /// As with the fixed variant, intervals below one millisecond are
    /// rejected rather than truncated to a zero expiry at the store.
    pub fn try_new(
        store: S,
        key: impl Into<String>,
        interval: Duration,
        rate: i64,
    ) -> Result<Self> {
        if interval.as_millis() == 0 {
            return Err(ConfigError::InvalidInterval(
                "interval must be at least one millisecond".into(),
            )
            .into());
        }

        Ok(Self {
            store,
            key: key.into(),
            interval,
            rate,
        })
    }

    /// The key this limiter coordinates on.
    pub fn key(&self) -> &str {
        &self.key
    }

    async fn limit(&self) -> std::result::Result<bool, crate::error::StoreError> {
        self.store
            .eval_admit(
                SLIDING_WINDOW_SCRIPT,
                &self.key,
                &[
                    self.interval.as_millis() as i64,
                    self.rate,
                    current_timestamp_ms(),
                ],
            )
            .await
    }
}

impl<S: AtomicStore> Limiter for DistributedSlidingWindowLimiter<S> {
    fn name(&self) -> &'static str {
        "distributed_sliding_window"
    }

    async fn acquire(&self, deadline: Option<Duration>) -> Result<Decision> {
        let outcome = match deadline {
            Some(budget) => match tokio::time::timeout(budget, self.limit()).await {
                Ok(outcome) => outcome,
                Err(_) => return Ok(Decision::Deny(DenyReason::Cancelled)),
            },
            None => self.limit().await,
        };

        match outcome {
            Ok(true) => Ok(Decision::Deny(DenyReason::LimitExceeded)),
            Ok(false) => Ok(Decision::Allow),
            Err(err) => {
                tracing::warn!(
                    key = %self.key,
                    error = %err,
                    "sliding window store call failed; failing open"
                );
                Ok(Decision::Allow)
            }
        }
    }
}
