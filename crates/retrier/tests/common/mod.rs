//! Shared fixtures for the retry integration tests.

#![allow(dead_code)]

use retrier::Cancelled;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Error returned by test operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestError {
    #[error("foo")]
    Foo,
    #[error("attempt {0} failed")]
    Attempt(u32),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Counts operation invocations.
#[derive(Debug, Default)]
pub struct Calls(AtomicU32);

impl Calls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an invocation and return its 1-indexed number.
    pub fn hit(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Total time slept by `sleeps` backoff delays starting at `initial`.
///
/// Each step rounds to whole nanoseconds, the same way the engine does.
pub fn expected_backoff(initial: Duration, coefficient: f64, sleeps: u32) -> Duration {
    let mut delay = initial;
    let mut total = Duration::ZERO;
    for _ in 0..sleeps {
        total += delay;
        delay = Duration::from_nanos((delay.as_nanos() as f64 * coefficient).round() as u64);
    }
    total
}
