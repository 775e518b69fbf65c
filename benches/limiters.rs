//! Benchmarks for the non-suspending local limiter hot paths.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gatelimit::{FixedWindowLimiter, SlidingWindowLimiter};

fn bench_fixed_window(c: &mut Criterion) {
    // A rate high enough that the bench never saturates the window.
    let limiter = FixedWindowLimiter::new(Duration::from_secs(1), 1 << 23);

    c.bench_function("fixed_window_check", |b| {
        b.iter(|| black_box(limiter.check()))
    });
}

fn bench_sliding_window(c: &mut Criterion) {
    let limiter = SlidingWindowLimiter::new(Duration::from_millis(10), 1024);

    c.bench_function("sliding_window_check", |b| {
        b.iter(|| black_box(limiter.check()))
    });
}

criterion_group!(benches, bench_fixed_window, bench_sliding_window);
criterion_main!(benches);
