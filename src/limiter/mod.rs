//! Admission limiter trait and implementations.
//!
//! This module defines the `Limiter` trait and provides the admission
//! algorithms, each independently usable.
//!
//! # Available Limiters
//!
//! - **Fixed Window**: counter per time window, lock-free
//! - **Sliding Window**: rolling timestamp log, lock-protected
//! - **Leaky Bucket**: paced admission, one per tick
//! - **Token Bucket**: accumulating tokens up to a capacity
//! - **Distributed Fixed/Sliding Window**: same window semantics, coordinated
//!   through a shared store that executes the decision atomically

mod distributed_fixed_window;
mod distributed_sliding_window;
mod fixed_window;
mod leaky_bucket;
mod sliding_window;
mod token_bucket;

pub use distributed_fixed_window::DistributedFixedWindowLimiter;
pub use distributed_sliding_window::DistributedSlidingWindowLimiter;
pub use fixed_window::FixedWindowLimiter;
pub use leaky_bucket::LeakyBucketLimiter;
pub use sliding_window::SlidingWindowLimiter;
pub use token_bucket::TokenBucketLimiter;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decision::{Decision, DenyReason};
use crate::error::Result;

/// Admission limiter trait.
///
/// Given a request arrival, produce an Allow/Deny decision. All
/// implementations are safe for concurrent use by many callers against one
/// shared, long-lived limiter instance.
///
/// # Limiter Comparison
///
/// | Limiter | Suspends | Synchronization | Scope |
/// |---------|----------|-----------------|-------|
/// | Fixed Window | Never | Single CAS | Process |
/// | Sliding Window | Brief lock | Mutex | Process |
/// | Leaky Bucket | Until tick | Paced semaphore | Process |
/// | Token Bucket | Until token | Bounded semaphore | Process |
/// | Distributed Fixed Window | Store round trip | Atomic script | Cluster |
/// | Distributed Sliding Window | Store round trip | Atomic script | Cluster |
pub trait Limiter: Send + Sync + 'static {
    /// Get the limiter name (for logging/metrics).
    fn name(&self) -> &'static str;

    /// Decide whether one arriving request is admitted.
    ///
    /// `deadline` carries the caller's cancellation budget. A deadline that
    /// fires before an admission slot becomes available always resolves to
    /// `Deny(Cancelled)`, never `Allow`. Limiters that decide without
    /// suspending ignore it; the distributed limiters bound their store
    /// round trip with it.
    fn acquire(
        &self,
        deadline: Option<Duration>,
    ) -> impl Future<Output = Result<Decision>> + Send;
}

impl<L: Limiter> Limiter for std::sync::Arc<L> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn acquire(&self, deadline: Option<Duration>) -> Result<Decision> {
        (**self).acquire(deadline).await
    }
}

/// What a bucket limiter resolves in-flight and future acquisitions to once
/// it has been shut down.
///
/// The default is `FailClosed`: a stopped limiter refuses requests. Failing
/// open turns a shutdown into an admission, which is only appropriate when
/// the protected service is being drained anyway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownBehavior {
    /// Deny with `DenyReason::ShutDown` after shutdown.
    #[default]
    FailClosed,
    /// Allow all requests after shutdown.
    FailOpen,
}

impl ShutdownBehavior {
    pub(crate) fn decision(self) -> Decision {
        match self {
            ShutdownBehavior::FailClosed => Decision::Deny(DenyReason::ShutDown),
            ShutdownBehavior::FailOpen => Decision::Allow,
        }
    }
}

/// Resolve when the caller's deadline fires; pend forever without one.
pub(crate) async fn deadline_elapsed(deadline: Option<Duration>) {
    match deadline {
        Some(budget) => tokio::time::sleep(budget).await,
        None => std::future::pending().await,
    }
}
