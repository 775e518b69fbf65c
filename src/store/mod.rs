//! Shared-store capability for the distributed limiters.
//!
//! The distributed limiters never read-then-write remote state: the whole
//! check-and-update runs as one atomically executed script at the store. This
//! module defines that single capability, `AtomicStore`, so the window
//! algorithms stay decoupled from the concrete store transport.

#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "redis")]
pub use redis::{RedisConfig, RedisStore};

use std::future::Future;

use crate::error::StoreError;

/// A store that executes a parameterized admission script atomically against
/// one key.
///
/// Implementations must guarantee that concurrent evaluations against the
/// same key are serialized at the store; that atomicity is the whole
/// correctness argument of the distributed limiters.
pub trait AtomicStore: Send + Sync + 'static {
    /// Execute `script` against `key` with integer arguments, returning
    /// whether the request is limited (`true` means deny).
    fn eval_admit(
        &self,
        script: &'static str,
        key: &str,
        args: &[i64],
    ) -> impl Future<Output = std::result::Result<bool, StoreError>> + Send;
}

impl<S: AtomicStore + ?Sized> AtomicStore for std::sync::Arc<S> {
    async fn eval_admit(
        &self,
        script: &'static str,
        key: &str,
        args: &[i64],
    ) -> std::result::Result<bool, StoreError> {
        (**self).eval_admit(script, key, args).await
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
pub(crate) fn current_timestamp_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as i64
}
