#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Bounded retry loops for fallible async operations.
//!
//! This crate runs an operation repeatedly until it succeeds or its attempt
//! budget (`max_retries + 1` attempts) is used up, with:
//!
//! - **Delay policies** via [`Delay`]: none, fixed, or exponential backoff
//!   compounding after every failing attempt
//! - **Explicit stop** via [`Stop`]: the operation decides when the loop ends
//! - **Cooperative cancellation** via [`CancelSignal`], polled before each
//!   attempt (`CancellationToken`, [`Deadline`], or your own signal)
//! - **Reusable strategies** via the [`RetryStrategy`] trait and [`Retrier`]
//! - **Configuration** via [`RetryConfig`] (TOML, JSON, environment)
//!
//! Attempts always run one after another. All loop state lives inside a
//! single call, so independent calls never interfere.
//!
//! # Examples
//!
//! Free functions cover the common cases:
//!
//! ```rust
//! use retrier::retry_with_delay;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let _manifest = retry_with_delay(3, Duration::from_millis(50), || async {
//!     std::fs::read_to_string("Cargo.toml")
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Using the prelude with a backoff strategy and a cancellation token:
//!
//! ```rust
//! use retrier::prelude::*;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug, thiserror::Error)]
//! enum JobError {
//!     #[error("busy")]
//!     Busy,
//!     #[error(transparent)]
//!     Cancelled(#[from] Cancelled),
//! }
//!
//! # async fn example() -> Result<(), JobError> {
//! let shutdown = CancellationToken::new();
//! let backoff = Retrier::backoff(Duration::from_millis(100), 2.0);
//!
//! backoff
//!     .retry_with_cancel(&shutdown, 5, || async { Err::<(), _>(JobError::Busy) })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod delay;
pub mod engine;
pub mod error;
pub mod stop;
pub mod strategy;

pub use cancel::{CancelSignal, Deadline, NeverCancel};
pub use config::RetryConfig;
pub use delay::{Delay, DelaySchedule};
pub use engine::{
    retry, retry_with_cancel, retry_with_delay, retry_with_delay_cancel, retry_with_stop,
    retry_with_stop_cancel,
};
pub use error::{Cancelled, ConfigError};
pub use stop::Stop;
pub use strategy::{Retrier, RetryStrategy};

/// Convenient re-exports of commonly used items.
///
/// Import everything with:
///
/// ```rust
/// use retrier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cancel::{CancelSignal, Deadline, NeverCancel};
    pub use crate::config::RetryConfig;
    pub use crate::delay::Delay;
    pub use crate::error::Cancelled;
    pub use crate::stop::Stop;
    pub use crate::strategy::{Retrier, RetryStrategy};
}
