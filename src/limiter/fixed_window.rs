//! Fixed window admission limiter.
//!
//! Counts admissions in a fixed-size window that resets when the window
//! elapses. The window start and the counter live in one atomic word and are
//! advanced with a single compare-and-swap, so a reset and an increment can
//! never interleave: there is no boundary race between the caller that opens
//! a new window and callers still incrementing the old one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::decision::{Decision, DenyReason};
use crate::error::{ConfigError, Result};
use crate::limiter::Limiter;

/// Number of low bits holding the admission count.
const COUNT_BITS: u32 = 24;
const COUNT_MASK: u64 = (1 << COUNT_BITS) - 1;

/// Fixed window admission limiter.
///
/// Lock-free and non-suspending: `acquire` resolves immediately and ignores
/// the caller's deadline. A denied attempt does not mutate the window, so
/// repeated denials have no side effects.
///
/// The window start is stored as milliseconds since the limiter was created,
/// packed into the upper 40 bits of the state word (enough for ~34 years of
/// uptime); the count takes the lower 24 bits.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    /// Packed `(window start offset ms) << COUNT_BITS | count`.
    state: AtomicU64,
    interval_ms: u64,
    rate: u64,
    origin: Instant,
}

impl FixedWindowLimiter {
    /// Largest rate that fits in the packed counter.
    pub const MAX_RATE: u64 = COUNT_MASK;

    /// Create a new fixed window limiter admitting at most `rate` requests
    /// per `interval`.
    ///
    /// A rate of zero denies every request.
    ///
    /// # Panics
    ///
    /// Panics on a configuration [`try_new`](Self::try_new) would reject.
    pub fn new(interval: Duration, rate: u64) -> Self {
        match Self::try_new(interval, rate) {
            Ok(limiter) => limiter,
            Err(err) => panic!("invalid fixed window configuration: {err}"),
        }
    }

    /// Try to create a new fixed window limiter, returning an error if the
    /// configuration is invalid.
    ///
    /// The window is tracked at millisecond granularity, so an interval
    /// below one millisecond is rejected: truncating it to zero would make
    /// every attempt see an expired window and the limiter would never
    /// limit.
    pub fn try_new(interval: Duration, rate: u64) -> Result<Self> {
        let interval_ms = interval.as_millis() as u64;
        if interval_ms == 0 {
            return Err(ConfigError::InvalidInterval(
                "interval must be at least one millisecond".into(),
            )
            .into());
        }
        if rate > Self::MAX_RATE {
            return Err(ConfigError::InvalidRate("rate must fit in 24 bits".into()).into());
        }

        Ok(Self {
            state: AtomicU64::new(0),
            interval_ms,
            rate,
            origin: Instant::now(),
        })
    }

    /// Decide without suspending. This is the whole algorithm; the async
    /// trait method delegates here.
    pub fn check(&self) -> Decision {
        let now = self.origin.elapsed().as_millis() as u64;

        loop {
            let current = self.state.load(Ordering::Acquire);
            let (start, count) = unpack(current);

            // An expired window is reopened at `now` with a zeroed count as
            // part of the same CAS that records the admission.
            let (start, count) = if now.saturating_sub(start) >= self.interval_ms {
                (now, 0)
            } else {
                (start, count)
            };

            if count >= self.rate {
                return Decision::Deny(DenyReason::LimitExceeded);
            }

            let next = pack(start, count + 1);
            if self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Decision::Allow;
            }
        }
    }
}

impl Limiter for FixedWindowLimiter {
    fn name(&self) -> &'static str {
        "fixed_window"
    }

    async fn acquire(&self, _deadline: Option<Duration>) -> Result<Decision> {
        Ok(self.check())
    }
}

fn pack(start_ms: u64, count: u64) -> u64 {
    (start_ms << COUNT_BITS) | (count & COUNT_MASK)
}

fn unpack(state: u64) -> (u64, u64) {
    (state >> COUNT_BITS, state & COUNT_MASK)
}
