//! Example: retrying a flaky operation
//!
//! This example demonstrates:
//! 1. Exponential backoff until success
//! 2. Explicit stop from inside the operation
//! 3. Cancellation through a `CancellationToken`
//!
//! Run with:
//! ```bash
//! RUST_LOG=retrier=debug cargo run -p retrier --example retry_example
//! ```

use retrier::prelude::*;
use retrier::retry_with_stop;
use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("transient error on attempt {0}")]
    Transient(u32),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// A simulated API that fails the first few times
struct UnreliableApi {
    attempts: AtomicU32,
    fail_count: u32,
}

impl UnreliableApi {
    fn new(fail_count: u32) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            fail_count,
        }
    }

    async fn call(&self) -> Result<String, ApiError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.fail_count {
            println!("  Attempt {attempt}: FAILED");
            Err(ApiError::Transient(attempt))
        } else {
            println!("  Attempt {attempt}: SUCCESS");
            Ok("API response data".to_string())
        }
    }
}

/// Example 1: exponential backoff
async fn example_backoff() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Exponential Backoff ===\n");

    let backoff = Retrier::backoff(Duration::from_millis(100), 2.0);
    let api = UnreliableApi::new(2);
    let start = Instant::now();

    let body = backoff.retry(3, || api.call()).await?;

    println!("\nResult: {body} after {:?} (100ms + 200ms of backoff)", start.elapsed());
    Ok(())
}

/// Example 2: the operation decides when to stop
async fn example_stop() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Explicit Stop ===\n");

    let polls = AtomicU32::new(0);
    let ready = retry_with_stop(9, |stop| {
        let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
        println!("  Poll {n}");
        if n == 3 {
            stop.stop();
        }
        async move { Ok::<_, ApiError>(n == 3) }
    })
    .await?;

    println!("\nReady: {ready} after {} polls", polls.load(Ordering::SeqCst));
    Ok(())
}

/// Example 3: cancellation is checked before every attempt
async fn example_cancel() {
    println!("\n=== Example 3: Cancellation ===\n");

    let shutdown = CancellationToken::new();
    let api = UnreliableApi::new(u32::MAX);
    let retrier = Retrier::fixed(Duration::from_millis(50));

    let result = retrier
        .retry_with_cancel(&shutdown, 10, || {
            if api.attempts.load(Ordering::SeqCst) == 2 {
                shutdown.cancel();
            }
            api.call()
        })
        .await;

    println!("\nResult: {result:?}");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    example_backoff().await?;
    example_stop().await?;
    example_cancel().await;
    Ok(())
}
