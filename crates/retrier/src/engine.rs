//! The retry loop and the free-function entry points.
//!
//! Every variant funnels into one loop: bounded retry ends on the first
//! success, explicit-stop retry only ends when the operation calls
//! [`Stop::stop`]. Both end when the budget of `max_retries + 1` attempts is
//! used up, and both sleep after every failing attempt when a delay is
//! configured.

use crate::cancel::CancelSignal;
use crate::delay::{Delay, DelaySchedule};
use crate::stop::Stop;
use std::future::Future;
use std::time::Duration;
#[cfg(feature = "tracing")]
use tracing::{debug, trace};

// Without the `tracing` feature the log calls compile to nothing.
#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// What besides budget exhaustion ends the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Until {
    /// The first successful attempt.
    Success,
    /// A call to [`Stop::stop`].
    Stopped,
}

/// State owned by a single retry invocation.
struct LoopState {
    retries: u32,
    stop: Stop,
    delays: DelaySchedule,
}

impl LoopState {
    fn new(delay: &Delay) -> Self {
        Self {
            retries: 0,
            stop: Stop::new(),
            delays: delay.schedule(),
        }
    }

    /// 1-indexed number of the attempt about to run.
    fn attempt(&self) -> u64 {
        u64::from(self.retries) + 1
    }
}

/// Drive attempts until success/stop, cancellation, or exhaustion.
///
/// `cancelled` is polled before every attempt; when it yields an error the
/// stop handle is raised and that error is returned without running the
/// operation or sleeping.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub(crate) async fn run<C, F, Fut, T, E>(
    max_retries: u32,
    delay: &Delay,
    until: Until,
    mut cancelled: C,
    mut operation: F,
) -> Result<T, E>
where
    C: FnMut() -> Option<E>,
    F: FnMut(Stop) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut state = LoopState::new(delay);
    let max_attempts = u64::from(max_retries) + 1;

    loop {
        let attempt = state.attempt();

        if let Some(err) = cancelled() {
            state.stop.stop();
            debug!(attempt, max_attempts, "retry cancelled before attempt");
            return Err(err);
        }

        trace!(attempt, max_attempts, "starting attempt");
        let outcome = operation(state.stop.clone()).await;

        if outcome.is_ok() {
            if until == Until::Success {
                return outcome;
            }
        } else if let Some(delay) = state.delays.next() {
            debug!(attempt, max_attempts, ?delay, "attempt failed, backing off");
            tokio::time::sleep(delay).await;
        } else {
            debug!(attempt, max_attempts, "attempt failed");
        }

        if state.stop.is_stopped() {
            debug!(attempt, max_attempts, "stop requested, ending retries");
            return outcome;
        }
        if state.retries == max_retries {
            debug!(attempt, max_attempts, "retry budget exhausted");
            return outcome;
        }
        state.retries += 1;
    }
}

fn never<E>() -> Option<E> {
    None
}

/// Retry `operation` at most `max_retries` more times, stopping at the first
/// success.
///
/// Returns the success, or the error of the last attempt once the budget is
/// exhausted. `max_retries = 0` runs exactly one attempt.
///
/// # Examples
///
/// ```rust
/// use retrier::retry;
///
/// # async fn example() {
/// let mut calls = 0;
/// let result = retry(3, || {
///     calls += 1;
///     let n = calls;
///     async move { if n == 4 { Ok(n) } else { Err("not yet") } }
/// })
/// .await;
///
/// assert_eq!(result, Ok(4));
/// # }
/// ```
pub async fn retry<F, Fut, T, E>(max_retries: u32, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    run(max_retries, &Delay::None, Until::Success, never, move |_| {
        operation()
    })
    .await
}

/// [`retry`], polling `signal` before every attempt.
///
/// A fired signal ends the loop at once with `E::from(reason)`; the
/// operation is not invoked for that attempt.
pub async fn retry_with_cancel<S, F, Fut, T, E>(
    signal: S,
    max_retries: u32,
    mut operation: F,
) -> Result<T, E>
where
    S: CancelSignal,
    E: From<S::Reason>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    run(
        max_retries,
        &Delay::None,
        Until::Success,
        || signal.is_cancelled().map(E::from),
        move |_| operation(),
    )
    .await
}

/// [`retry`], sleeping `delay` after every failing attempt.
///
/// The sleep also happens after the attempt that exhausts the budget.
pub async fn retry_with_delay<F, Fut, T, E>(
    max_retries: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    run(
        max_retries,
        &Delay::fixed(delay),
        Until::Success,
        never,
        move |_| operation(),
    )
    .await
}

/// [`retry_with_delay`], polling `signal` before every attempt.
///
/// Cancellation returns immediately, without sleeping.
pub async fn retry_with_delay_cancel<S, F, Fut, T, E>(
    signal: S,
    max_retries: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    S: CancelSignal,
    E: From<S::Reason>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    run(
        max_retries,
        &Delay::fixed(delay),
        Until::Success,
        || signal.is_cancelled().map(E::from),
        move |_| operation(),
    )
    .await
}

/// Run `operation` until it calls [`Stop::stop`] or `max_retries + 1`
/// attempts have run.
///
/// Success alone does not end the loop. Returns the outcome of the last
/// attempt that ran.
pub async fn retry_with_stop<F, Fut, T, E>(max_retries: u32, operation: F) -> Result<T, E>
where
    F: FnMut(Stop) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    run(max_retries, &Delay::None, Until::Stopped, never, operation).await
}

/// [`retry_with_stop`], polling `signal` before every attempt.
///
/// A fired signal raises the stop handle and returns `E::from(reason)`
/// without invoking the operation.
pub async fn retry_with_stop_cancel<S, F, Fut, T, E>(
    signal: S,
    max_retries: u32,
    operation: F,
) -> Result<T, E>
where
    S: CancelSignal,
    E: From<S::Reason>,
    F: FnMut(Stop) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    run(
        max_retries,
        &Delay::None,
        Until::Stopped,
        || signal.is_cancelled().map(E::from),
        operation,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_zero_retries_runs_once() {
        let calls = Cell::new(0);
        let result: Result<(), &str> = retry(0, || {
            calls.set(calls.get() + 1);
            async { Err("boom") }
        })
        .await;

        assert_eq!(result, Err("boom"));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_returns_last_failure() {
        let calls = Cell::new(0);
        let result: Result<(), u32> = retry(2, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Err(n) }
        })
        .await;

        assert_eq!(result, Err(3));
    }

    #[tokio::test]
    async fn test_cancel_raises_stop() {
        let seen = Cell::new(None::<Stop>);
        let checks = Cell::new(0);

        let result: Result<(), &str> = run(
            5,
            &Delay::None,
            Until::Stopped,
            || {
                checks.set(checks.get() + 1);
                (checks.get() == 2).then_some("cancelled")
            },
            |stop| {
                seen.set(Some(stop));
                async { Ok(()) }
            },
        )
        .await;

        assert_eq!(result, Err("cancelled"));
        let stop = seen.take().expect("first attempt ran");
        assert!(stop.is_stopped());
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn test_attempts_are_logged() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let result: Result<(), &str> = tracing::subscriber::with_default(subscriber, || {
            tokio_test::block_on(retry(1, || async { Err("boom") }))
        });
        assert_eq!(result, Err("boom"));

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("starting attempt").count(), 2);
        assert!(output.contains("retry budget exhausted"));
    }

    #[tokio::test]
    async fn test_max_budget_does_not_overflow_on_stop() {
        let result: Result<u8, ()> = retry_with_stop(u32::MAX, |stop| {
            stop.stop();
            async { Ok(7) }
        })
        .await;

        assert_eq!(result, Ok(7));
    }
}
