//! Property-based tests for the retry loop invariants
//!
//! Budgets, success points and stop points are generated; each case checks
//! how many times the operation ran and which outcome came back.

mod common;

use common::{Calls, TestError, expected_backoff};
use proptest::prelude::*;
use retrier::{Delay, Retrier, RetryStrategy, retry, retry_with_stop};
use std::time::Duration;

fn arb_budget() -> impl Strategy<Value = u32> {
    0u32..32
}

/// A paused current-thread runtime so sleeps cost no wall time
fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("Failed to build runtime")
}

proptest! {
    /// Property: an always-succeeding operation runs exactly once
    #[test]
    fn prop_success_runs_once(max_retries in arb_budget()) {
        let calls = Calls::new();
        let result = tokio_test::block_on(retry(max_retries, || {
            calls.hit();
            async { Ok::<_, TestError>(()) }
        }));

        prop_assert_eq!(result, Ok(()));
        prop_assert_eq!(calls.count(), 1);
    }

    /// Property: an always-failing operation runs `budget + 1` times and the
    /// last failure is returned
    #[test]
    fn prop_failure_exhausts_budget(max_retries in arb_budget()) {
        let calls = Calls::new();
        let result: Result<(), _> = tokio_test::block_on(retry(max_retries, || {
            let n = calls.hit();
            async move { Err(TestError::Attempt(n)) }
        }));

        prop_assert_eq!(result, Err(TestError::Attempt(max_retries + 1)));
        prop_assert_eq!(calls.count(), max_retries + 1);
    }

    /// Property: success on attempt k (k <= budget + 1) means exactly k calls
    #[test]
    fn prop_success_on_kth_attempt(
        (max_retries, k) in arb_budget().prop_flat_map(|b| (Just(b), 1..=b + 1)),
    ) {
        let calls = Calls::new();
        let result = tokio_test::block_on(retry(max_retries, || {
            let n = calls.hit();
            async move { if n == k { Ok(n) } else { Err(TestError::Foo) } }
        }));

        prop_assert_eq!(result, Ok(k));
        prop_assert_eq!(calls.count(), k);
    }

    /// Property: without stop, explicit-stop retry always uses the whole
    /// budget even on success
    #[test]
    fn prop_stop_never_called_exhausts_budget(max_retries in arb_budget()) {
        let calls = Calls::new();
        let result = tokio_test::block_on(retry_with_stop(max_retries, |_stop| {
            calls.hit();
            async { Ok::<_, TestError>(()) }
        }));

        prop_assert_eq!(result, Ok(()));
        prop_assert_eq!(calls.count(), max_retries + 1);
    }

    /// Property: calling stop on attempt j ends the loop after exactly j calls
    /// whatever that attempt returned
    #[test]
    fn prop_stop_on_jth_attempt(
        (max_retries, j) in arb_budget().prop_flat_map(|b| (Just(b), 1..=b + 1)),
        fail in any::<bool>(),
    ) {
        let calls = Calls::new();
        let result = tokio_test::block_on(retry_with_stop(max_retries, |stop| {
            let n = calls.hit();
            if n == j {
                stop.stop();
            }
            async move { if fail { Err(TestError::Attempt(n)) } else { Ok(n) } }
        }));

        let expected = if fail { Err(TestError::Attempt(j)) } else { Ok(j) };
        prop_assert_eq!(result, expected);
        prop_assert_eq!(calls.count(), j);
    }

    /// Property: k failures before success sleep at least the first k
    /// backoff delays
    #[test]
    fn prop_backoff_elapsed_covers_failures(
        failures in 0u32..8,
        initial_ms in 1u64..20,
        coefficient in 0.5f64..3.0,
    ) {
        let initial = Duration::from_millis(initial_ms);
        let retrier = Retrier::new(Delay::exponential(initial, coefficient));
        let calls = Calls::new();

        let elapsed = paused_runtime().block_on(async {
            let start = tokio::time::Instant::now();
            let result = retrier
                .retry(failures, || {
                    let n = calls.hit();
                    async move { if n > failures { Ok(n) } else { Err(TestError::Foo) } }
                })
                .await;
            assert_eq!(result, Ok(failures + 1));
            start.elapsed()
        });

        prop_assert_eq!(calls.count(), failures + 1);
        prop_assert!(elapsed >= expected_backoff(initial, coefficient, failures));
    }
}
