//! Error types.
//!
//! Operation failures are never wrapped: the engine returns the caller's own
//! error type. The types here cover the reasons produced by the built-in
//! cancellation signals and configuration loading.

use thiserror::Error;

/// Why a built-in [`CancelSignal`](crate::CancelSignal) stopped a retry loop.
///
/// Cancellable engine calls return `E::from(reason)`, so caller error types
/// usually carry a variant wrapping this one:
///
/// ```rust
/// use retrier::Cancelled;
///
/// #[derive(Debug, thiserror::Error)]
/// enum FetchError {
///     #[error("remote unavailable")]
///     Unavailable,
///     #[error(transparent)]
///     Cancelled(#[from] Cancelled),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Cancelled {
    /// The signal was cancelled explicitly.
    #[error("operation cancelled")]
    Cancelled,

    /// The signal's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Errors raised while loading a [`RetryConfig`](crate::RetryConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse.
    #[error("invalid value {value:?} for {var}")]
    InvalidValue {
        /// Variable name
        var: String,
        /// Raw value found
        value: String,
    },

    /// A backoff coefficient was given without an initial delay.
    #[error("{var} is required when a backoff coefficient is set")]
    MissingDelay {
        /// Variable that must be set
        var: String,
    },

    /// TOML configuration did not parse.
    #[error("invalid retry configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
