//! Request-admission layer: interchangeable rate limiting algorithms.
//!
//! `gatelimit` decides, per incoming request, whether to admit or reject it,
//! protecting a downstream service from exceeding a configured throughput:
//!
//! - **Local limiters**: Fixed Window (lock-free), Sliding Window
//!   (lock-protected log), Leaky Bucket (paced), Token Bucket (bursting)
//! - **Distributed limiters**: Fixed and Sliding Window coordinated through
//!   Redis, with the whole decision executed as one atomic script
//! - **Unified verdicts**: threshold breaches, caller timeouts, and shutdown
//!   are distinct outcomes, never overloaded into one status
//! - **Framework integration**: Axum/tower middleware
//!
//! # Quick Start
//!
//! ```ignore
//! use gatelimit::{Limiter, TokenBucketLimiter};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Up to 10 accumulated tokens, one replenished per 100ms.
//!     let limiter = TokenBucketLimiter::new(10, Duration::from_millis(100));
//!
//!     let decision = limiter.acquire(Some(Duration::from_secs(1))).await.unwrap();
//!     if decision.is_allowed() {
//!         println!("Request admitted");
//!     } else {
//!         println!("Rejected: {:?}", decision.deny_reason());
//!     }
//! }
//! ```
//!
//! # Limiters
//!
//! | Limiter | Pacing | Scope | Suspends |
//! |---------|--------|-------|----------|
//! | Fixed Window | Per-window counter | Process | Never |
//! | Sliding Window | Trailing interval | Process | Brief lock |
//! | Leaky Bucket | One per tick | Process | Until tick |
//! | Token Bucket | Bursts up to capacity | Process | Until token |
//! | Distributed Fixed Window | Per-window counter | Cluster | Store round trip |
//! | Distributed Sliding Window | Trailing interval | Cluster | Store round trip |
//!
//! # Feature Flags
//!
//! - `redis`: Redis-backed [`store::RedisStore`] for the distributed limiters
//! - `axum`: Axum/tower middleware integration

pub mod decision;
pub mod error;
pub mod limiter;
pub mod store;

#[cfg(feature = "axum")]
pub mod middleware;

// Re-export main types
pub use decision::{Decision, DenyReason};
pub use error::{ConfigError, LimitError, Result, StoreError};
pub use limiter::{Limiter, ShutdownBehavior};

// Re-export limiters
pub use limiter::{
    DistributedFixedWindowLimiter, DistributedSlidingWindowLimiter, FixedWindowLimiter,
    LeakyBucketLimiter, SlidingWindowLimiter, TokenBucketLimiter,
};

// Re-export store types
pub use store::AtomicStore;

#[cfg(feature = "redis")]
pub use store::{RedisConfig, RedisStore};

#[cfg(feature = "axum")]
pub use middleware::RateLimitLayer;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::decision::{Decision, DenyReason};
    pub use crate::error::{LimitError, Result};
    pub use crate::limiter::{Limiter, ShutdownBehavior};

    pub use crate::limiter::{
        DistributedFixedWindowLimiter, DistributedSlidingWindowLimiter, FixedWindowLimiter,
        LeakyBucketLimiter, SlidingWindowLimiter, TokenBucketLimiter,
    };

    pub use crate::store::AtomicStore;

    #[cfg(feature = "redis")]
    pub use crate::store::{RedisConfig, RedisStore};
}
