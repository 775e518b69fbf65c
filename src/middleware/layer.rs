//! Tower layer for request admission in Axum.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
};
use tower::{Layer, Service};

use crate::decision::{Decision, DenyReason};
use crate::limiter::Limiter;

/// Tower layer that guards the inner service with a limiter.
pub struct RateLimitLayer<L> {
    limiter: Arc<L>,
    deadline: Option<Duration>,
}

impl<L> RateLimitLayer<L> {
    /// Create a new rate limit layer around a limiter.
    ///
    /// Without a deadline, a suspending limiter (the buckets) parks a
    /// request until a slot frees up; set one with
    /// [`with_deadline`](Self::with_deadline) to bound the wait.
    pub fn new(limiter: L) -> Self {
        Self {
            limiter: Arc::new(limiter),
            deadline: None,
        }
    }

    /// Bound each request's admission wait. A request still waiting when
    /// the deadline fires is rejected with `408 Request Timeout`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl<L> Clone for RateLimitLayer<L> {
    fn clone(&self) -> Self {
        Self {
            limiter: self.limiter.clone(),
            deadline: self.deadline,
        }
    }
}

impl<L, Inner> Layer<Inner> for RateLimitLayer<L> {
    type Service = RateLimitService<L, Inner>;

    fn layer(&self, inner: Inner) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            deadline: self.deadline,
        }
    }
}

/// The admission-guarding service.
pub struct RateLimitService<L, Inner> {
    inner: Inner,
    limiter: Arc<L>,
    deadline: Option<Duration>,
}

impl<L, Inner> Clone for RateLimitService<L, Inner>
where
    Inner: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: self.limiter.clone(),
            deadline: self.deadline,
        }
    }
}

impl<L, Inner> Service<Request<Body>> for RateLimitService<L, Inner>
where
    L: Limiter,
    Inner: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    Inner::Future: Send,
{
    type Response = Response<Body>;
    type Error = Inner::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();
        let deadline = self.deadline;

        Box::pin(async move {
            let decision = limiter.acquire(deadline).await.unwrap_or_else(|err| {
                // On an internal error, admit the request (fail open).
                tracing::warn!(limiter = limiter.name(), error = %err, "admission check failed; failing open");
                Decision::Allow
            });

            match decision {
                Decision::Allow => inner.call(request).await,
                Decision::Deny(reason) => Ok(rejection_response(reason)),
            }
        })
    }
}

/// Map a denial reason to its response status.
fn status_for(reason: DenyReason) -> StatusCode {
    match reason {
        DenyReason::LimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        DenyReason::Cancelled => StatusCode::REQUEST_TIMEOUT,
        DenyReason::ShutDown => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Build the short-circuit rejection response.
fn rejection_response(reason: DenyReason) -> Response<Body> {
    let status = status_for(reason);
    let body = format!(
        r#"{{"error":"{}"}}"#,
        status.canonical_reason().unwrap_or("Denied")
    );

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert("content-type", "application/json".parse().unwrap());

    response
}
