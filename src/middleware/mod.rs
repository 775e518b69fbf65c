//! Framework middleware integrations.
//!
//! Composes a limiter into an HTTP pipeline: the limiter runs once per
//! incoming request before the protected handler, short-circuiting with a
//! rejection status on Deny and passing control through unchanged on Allow.

mod layer;

pub use layer::{RateLimitLayer, RateLimitService};
