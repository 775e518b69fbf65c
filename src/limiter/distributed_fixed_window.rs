//! Distributed fixed window admission limiter.
//!
//! Same window semantics as [`FixedWindowLimiter`](crate::FixedWindowLimiter),
//! but the decision is delegated to a script executed atomically by a shared
//! store, making it correct across many independent service instances. The
//! limiter itself holds no window state, only its configuration.
//!
//! [`FixedWindowLimiter`]: crate::FixedWindowLimiter

use std::time::Duration;

use crate::decision::{Decision, DenyReason};
use crate::error::{ConfigError, Result};
use crate::limiter::Limiter;
use crate::store::AtomicStore;

const FIXED_WINDOW_SCRIPT: &str = include_str!("lua/fixed_window.lua");

/// Distributed fixed window admission limiter.
///
/// Every decision is one round trip to the store: if the key is absent it is
/// created with count 1 and an expiry of one interval, otherwise the counter
/// is incremented while below the rate. The script runs atomically, so
/// concurrent callers across processes cannot race past the rate.
///
/// A store failure fails open: the error is logged and the request admitted,
/// so an unreachable store never becomes a global outage.
#[derive(Debug)]
pub struct DistributedFixedWindowLimiter<S> {
    store: S,
    key: String,
    interval: Duration,
    rate: i64,
}

impl<S: AtomicStore> DistributedFixedWindowLimiter<S> {
    /// Create a new distributed fixed window limiter admitting at most
    /// `rate` requests per `interval` across all processes sharing `key`.
    ///
    /// # Panics
    ///
    /// Panics on a configuration [`try_new`](Self::try_new) would reject.
    pub fn new(store: S, key: impl Into<String>, interval: Duration, rate: i64) -> Self {
        match Self::try_new(store, key, interval, rate) {
            Ok(limiter) => limiter,
            Err(err) => panic!("invalid distributed fixed window configuration: {err}"),
        }
    }

    /// Try to create a new distributed fixed window limiter, returning an
    /// error if the configuration is invalid.
    ///
    /// The interval is sent to the store in milliseconds, so anything below
    /// one millisecond is rejected: it would truncate to a zero expiry,
    /// which the store refuses, and every decision would degrade into a
    /// logged fail-open admission.
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
                FIXED_WINDOW_SCRIPT,
                &self.key,
                &[self.interval.as_millis() as i64, self.rate],
            )
            .await
    }
}

impl<S: AtomicStore> Limiter for DistributedFixedWindowLimiter<S> {
    fn name(&self) -> &'static str {
        "distributed_fixed_window"
    }

    async fn acquire(&self, deadline: Option<Duration>) -> Result<Decision> {
        let outcome = match deadline {
            Some(budget) => match tokio::time::timeout(budget, self.limit()).await {
                Ok(outcome) => outcome,
                // The caller's deadline fired mid round trip.
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
                    "fixed window store call failed; failing open"
                );
                Ok(Decision::Allow)
            }
        }
    }
}
