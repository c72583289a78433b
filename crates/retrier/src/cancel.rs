//! Poll-based cancellation.
//!
//! The engine asks a [`CancelSignal`] whether it has fired before every
//! attempt, including the first. Signals are never awaited: a cancellation
//! raised while an attempt or a delay is in progress only prevents the next
//! attempt from starting.

use crate::error::Cancelled;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// An externally owned signal that can abort a retry loop.
///
/// Implement this to plug a custom source (a shutdown flag, a request
/// context) into the cancellable engine calls. The reason is converted into
/// the caller's error type with `From`.
///
/// # Examples
///
/// ```rust
/// use retrier::CancelSignal;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Shutdown(AtomicBool);
///
/// impl CancelSignal for Shutdown {
///     type Reason = String;
///
///     fn is_cancelled(&self) -> Option<String> {
///         self.0
///             .load(Ordering::Acquire)
///             .then(|| "shutting down".to_string())
///     }
/// }
/// ```
pub trait CancelSignal {
    /// Value surfaced to the caller once the signal has fired.
    type Reason;

    /// `Some(reason)` if the signal has already fired.
    fn is_cancelled(&self) -> Option<Self::Reason>;
}

impl<S: CancelSignal + ?Sized> CancelSignal for &S {
    type Reason = S::Reason;

    fn is_cancelled(&self) -> Option<Self::Reason> {
        (**self).is_cancelled()
    }
}

impl<S: CancelSignal + ?Sized> CancelSignal for Arc<S> {
    type Reason = S::Reason;

    fn is_cancelled(&self) -> Option<Self::Reason> {
        (**self).is_cancelled()
    }
}

impl CancelSignal for CancellationToken {
    type Reason = Cancelled;

    fn is_cancelled(&self) -> Option<Cancelled> {
        CancellationToken::is_cancelled(self).then_some(Cancelled::Cancelled)
    }
}

/// Stand-in for deadlines past the end of the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Fires once a point in time has passed.
///
/// Measured on the tokio clock so paused-time tests stay deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline at an absolute instant.
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// Deadline `timeout` from now.
    ///
    /// Timeouts too large to represent, such as `Duration::MAX`, become a
    /// deadline roughly 30 years away.
    pub fn after(timeout: Duration) -> Self {
        let now = Instant::now();
        Self::at(now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE))
    }

    /// The instant this deadline fires.
    pub fn instant(&self) -> Instant {
        self.at
    }
}

impl CancelSignal for Deadline {
    type Reason = Cancelled;

    fn is_cancelled(&self) -> Option<Cancelled> {
        (Instant::now() >= self.at).then_some(Cancelled::DeadlineExceeded)
    }
}

/// A signal that never fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    type Reason = Cancelled;

    fn is_cancelled(&self) -> Option<Cancelled> {
        None
    }
}
