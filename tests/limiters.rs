//! Integration tests for the local admission limiters.

use std::sync::Arc;
use std::time::Duration;

use gatelimit::{
    Decision, DenyReason, FixedWindowLimiter, LeakyBucketLimiter, Limiter, ShutdownBehavior,
    SlidingWindowLimiter, TokenBucketLimiter,
};

#[tokio::test]
async fn test_fixed_window_allow_deny_reset() {
    let limiter = FixedWindowLimiter::new(Duration::from_millis(300), 1);

    assert!(limiter.acquire(None).await.unwrap().is_allowed());

    let decision = limiter.acquire(None).await.unwrap();
    assert_eq!(decision, Decision::Deny(DenyReason::LimitExceeded));

    tokio::time::sleep(Duration::from_millis(350)).await;

    assert!(limiter.acquire(None).await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_sliding_window_fills_then_prunes() {
    let limiter = SlidingWindowLimiter::new(Duration::from_millis(300), 5);

    for i in 1..=5 {
        let decision = limiter.acquire(None).await.unwrap();
        assert!(decision.is_allowed(), "Request {} should be allowed", i);
    }

    let decision = limiter.acquire(None).await.unwrap();
    assert_eq!(decision, Decision::Deny(DenyReason::LimitExceeded));

    tokio::time::sleep(Duration::from_millis(350)).await;

    // All prior entries pruned from the trailing interval.
    assert!(limiter.acquire(None).await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_token_bucket_first_request_allows() {
    let limiter = TokenBucketLimiter::new(10, Duration::from_millis(50));

    // No deadline: a fresh limiter must eventually admit, never deny, as
    // long as the caller does not give up.
    let decision = limiter.acquire(None).await.unwrap();
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn test_token_bucket_deny_only_on_cancellation() {
    let limiter = TokenBucketLimiter::new(10, Duration::from_secs(2));

    assert!(limiter.acquire(None).await.unwrap().is_allowed());

    let decision = limiter
        .acquire(Some(Duration::from_millis(30)))
        .await
        .unwrap();
    assert_eq!(decision, Decision::Deny(DenyReason::Cancelled));
}

#[tokio::test]
async fn test_leaky_bucket_short_deadline_denies() {
    let limiter = LeakyBucketLimiter::new(Duration::from_millis(500));

    assert!(limiter.acquire(None).await.unwrap().is_allowed());

    // Issued immediately after an admission, with a deadline shorter than
    // the pacing interval: must deny timeout-class, never allow.
    let decision = limiter
        .acquire(Some(Duration::from_millis(30)))
        .await
        .unwrap();
    assert_eq!(decision, Decision::Deny(DenyReason::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fixed_window_concurrent_callers_exact() {
    let limiter = Arc::new(FixedWindowLimiter::new(Duration::from_secs(10), 5));

    let mut handles = Vec::new();
    for _ in 0..40 {
        let limiter = Arc::clone(&limiter);
        handles.push(tokio::spawn(async move {
            limiter.acquire(None).await.unwrap().is_allowed()
        }));
    }

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            allowed += 1;
        }
    }

    // The window state moves under a single CAS, so the admission count is
    // exact even at a window boundary.
    assert_eq!(allowed, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sliding_window_concurrent_callers_exact() {
    let limiter = Arc::new(SlidingWindowLimiter::new(Duration::from_secs(10), 5));

    let mut handles = Vec::new();
    for _ in 0..40 {
        let limiter = Arc::clone(&limiter);
        handles.push(tokio::spawn(async move {
            limiter.acquire(None).await.unwrap().is_allowed()
        }));
    }

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            allowed += 1;
        }
    }

    assert_eq!(allowed, 5);
}

#[tokio::test]
async fn test_repeated_denials_have_no_side_effects() {
    let limiter = SlidingWindowLimiter::new(Duration::from_millis(300), 2);

    assert!(limiter.acquire(None).await.unwrap().is_allowed());
    assert!(limiter.acquire(None).await.unwrap().is_allowed());

    for _ in 0..20 {
        assert!(limiter.acquire(None).await.unwrap().is_denied());
    }

    tokio::time::sleep(Duration::from_millis(350)).await;

    // Denied attempts were not recorded; the window recovers on schedule.
    assert!(limiter.acquire(None).await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_shutdown_behavior_is_explicit() {
    let closed = TokenBucketLimiter::new(5, Duration::from_secs(60));
    closed.shutdown();
    assert_eq!(
        closed.acquire(None).await.unwrap(),
        Decision::Deny(DenyReason::ShutDown)
    );

    let open = LeakyBucketLimiter::with_shutdown_behavior(
        Duration::from_secs(60),
        ShutdownBehavior::FailOpen,
    );
    open.shutdown();
    assert!(open.acquire(None).await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_separate_limiters_independent() {
    let first = FixedWindowLimiter::new(Duration::from_secs(10), 1);
    let second = FixedWindowLimiter::new(Duration::from_secs(10), 1);

    assert!(first.acquire(None).await.unwrap().is_allowed());
    assert!(first.acquire(None).await.unwrap().is_denied());

    // A different instance owns a different window.
    assert!(second.acquire(None).await.unwrap().is_allowed());
}
