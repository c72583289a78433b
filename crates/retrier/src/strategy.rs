//! The retry strategy abstraction and its delay-carrying implementation.

use crate::cancel::CancelSignal;
use crate::delay::Delay;
use crate::engine::{Until, run};
use crate::stop::Stop;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// A reusable way of retrying operations.
///
/// Each method is one retry invocation: the attempt counter, stop flag and
/// current delay are created fresh on every call, so a single strategy can
/// serve many concurrent callers.
///
/// Implementations are expected to honor the loop contract:
///
/// - at most `max_retries + 1` attempts, strictly one after another
/// - `retry*` ends at the first success; `retry_with_stop*` only ends when the
///   operation calls [`Stop::stop`]
/// - cancellable variants poll the signal before every attempt and return
///   `E::from(reason)` without invoking the operation once it has fired
///
/// # Examples
///
/// ```rust
/// use retrier::{Retrier, RetryStrategy};
/// use std::time::Duration;
///
/// async fn load<R: RetryStrategy>(strategy: &R) -> Result<String, std::io::Error> {
///     strategy
///         .retry(3, || async { std::fs::read_to_string("settings.toml") })
///         .await
/// }
///
/// # async fn example() {
/// let backoff = Retrier::backoff(Duration::from_millis(100), 2.0);
/// let _ = load(&backoff).await;
/// # }
/// ```
#[async_trait]
pub trait RetryStrategy: Send + Sync {
    /// Retry until the first success or until the budget is exhausted.
    ///
    /// # Returns
    /// - `Ok(T)`: the first successful result
    /// - `Err(E)`: the error of the final attempt, unchanged
    async fn retry<F, Fut, T, E>(&self, max_retries: u32, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Send;

    /// [`RetryStrategy::retry`], polling `signal` before every attempt.
    async fn retry_with_cancel<S, F, Fut, T, E>(
        &self,
        signal: S,
        max_retries: u32,
        operation: F,
    ) -> Result<T, E>
    where
        S: CancelSignal + Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: From<S::Reason> + Send;

    /// Retry until the operation calls [`Stop::stop`] or the budget is
    /// exhausted.
    ///
    /// Returns whatever the last attempt that ran produced.
    async fn retry_with_stop<F, Fut, T, E>(&self, max_retries: u32, operation: F) -> Result<T, E>
    where
        F: FnMut(Stop) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Send;

    /// [`RetryStrategy::retry_with_stop`], polling `signal` before every
    /// attempt.
    ///
    /// On cancellation the stop handle is raised before returning.
    async fn retry_with_stop_cancel<S, F, Fut, T, E>(
        &self,
        signal: S,
        max_retries: u32,
        operation: F,
    ) -> Result<T, E>
    where
        S: CancelSignal + Send,
        F: FnMut(Stop) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: From<S::Reason> + Send;
}

/// Retries operations, pausing after failures according to a [`Delay`].
///
/// # Examples
///
/// ```rust
/// use retrier::{Retrier, RetryStrategy};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), std::io::Error> {
/// // Sleeps 100ms, 200ms, 400ms ... after consecutive failures
/// let backoff = Retrier::backoff(Duration::from_millis(100), 2.0);
///
/// let value = backoff
///     .retry(3, || async { Ok::<_, std::io::Error>(42) })
///     .await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Retrier {
    delay: Delay,
}

impl Retrier {
    /// Retrier using the given delay policy.
    pub fn new(delay: Delay) -> Self {
        Self { delay }
    }

    /// Retrier that never sleeps between attempts.
    pub fn immediate() -> Self {
        Self::new(Delay::None)
    }

    /// Retrier that sleeps `delay` after each failing attempt.
    pub fn fixed(delay: Duration) -> Self {
        Self::new(Delay::fixed(delay))
    }

    /// Retrier with exponential backoff.
    ///
    /// The first failure sleeps `initial_delay`; every later failure of the
    /// same invocation sleeps the previous delay times `coefficient`, rounded
    /// to the nearest nanosecond.
    pub fn backoff(initial_delay: Duration, coefficient: f64) -> Self {
        Self::new(Delay::exponential(initial_delay, coefficient))
    }

    /// The configured delay policy.
    pub fn delay(&self) -> Delay {
        self.delay
    }
}

impl From<Delay> for Retrier {
    fn from(delay: Delay) -> Self {
        Self::new(delay)
    }
}

#[async_trait]
impl RetryStrategy for Retrier {
    async fn retry<F, Fut, T, E>(&self, max_retries: u32, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Send,
    {
        run(
            max_retries,
            &self.delay,
            Until::Success,
            || None,
            move |_| operation(),
        )
        .await
    }

    async fn retry_with_cancel<S, F, Fut, T, E>(
        &self,
        signal: S,
        max_retries: u32,
        mut operation: F,
    ) -> Result<T, E>
    where
        S: CancelSignal + Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: From<S::Reason> + Send,
    {
        run(
            max_retries,
            &self.delay,
            Until::Success,
            move || signal.is_cancelled().map(E::from),
            move |_| operation(),
        )
        .await
    }

    async fn retry_with_stop<F, Fut, T, E>(&self, max_retries: u32, operation: F) -> Result<T, E>
    where
        F: FnMut(Stop) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Send,
    {
        run(max_retries, &self.delay, Until::Stopped, || None, operation).await
    }

    async fn retry_with_stop_cancel<S, F, Fut, T, E>(
        &self,
        signal: S,
        max_retries: u32,
        operation: F,
    ) -> Result<T, E>
    where
        S: CancelSignal + Send,
        F: FnMut(Stop) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: From<S::Reason> + Send,
    {
        run(
            max_retries,
            &self.delay,
            Until::Stopped,
            move || signal.is_cancelled().map(E::from),
            operation,
        )
        .await
    }
}
