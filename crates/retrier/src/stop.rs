//! The stop handle handed to explicit-stop operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Requests that no further attempts run after the current one.
///
/// Every attempt of one retry invocation receives a clone of the same handle,
/// so the flag is owned by the loop. Calling [`Stop::stop`] is idempotent and
/// does not change the outcome of the attempt that calls it.
///
/// # Examples
///
/// ```rust
/// use retrier::retry_with_stop;
///
/// # async fn example() {
/// let mut calls = 0;
/// let result = retry_with_stop(9, |stop| {
///     calls += 1;
///     if calls == 2 {
///         stop.stop();
///     }
///     async { Ok::<_, std::io::Error>(()) }
/// })
/// .await;
///
/// assert!(result.is_ok());
/// assert_eq!(calls, 2);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Stop {
    stopped: Arc<AtomicBool>,
}

impl Stop {
    /// Create a handle that has not been stopped.
    pub fn new() -> Self {
        Self::default()
    }

    /// End the retry loop once the current attempt completes.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether [`Stop::stop`] has been called on this handle or a clone.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}
